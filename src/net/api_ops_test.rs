use super::*;

#[test]
fn model_actions_format_expected_paths() {
    assert_eq!(detail_action_path(MODELS_PATH, 2, "activate"), "/v1/models/2/activate/");
    assert_eq!(detail_action_path(MODELS_PATH, 2, "reload_model"), "/v1/models/2/reload_model/");
}

#[test]
fn service_refresh_is_a_list_action() {
    assert_eq!(list_action_path(SERVICES_PATH, "refresh_status"), "/v1/services/refresh_status/");
}

#[test]
fn service_start_reply_carries_pid() {
    let reply: ServiceActionReply =
        serde_json::from_str(r#"{"status":"success","message":"started","pid":4242}"#).unwrap();
    assert_eq!(reply.pid, Some(4242));
}

#[test]
fn service_warning_reply_has_no_pid() {
    let reply: ServiceActionReply = serde_json::from_str(r#"{"status":"warning","message":"already running"}"#).unwrap();
    assert_eq!(reply.status.as_deref(), Some("warning"));
    assert_eq!(reply.pid, None);
}

#[test]
fn dashboard_statistics_decode_backend_shape() {
    let stats: DashboardStatistics = serde_json::from_value(serde_json::json!({
        "template_count": 12,
        "category_count": 3,
        "knowledge_base_count": 2,
        "document_count": 40,
        "system_status": { "model_status": "running", "api_status": "stopped" },
        "api_calls": { "today": 128, "total": 5763 },
        "recent_activities": [{ "title": "updated template", "time": "2023-12-15 14:30", "type": "template" }]
    }))
    .unwrap();
    assert_eq!(stats.template_count, 12);
    assert_eq!(stats.system_status.model_status.as_deref(), Some("running"));
    assert_eq!(stats.api_calls.total, 5763);
    assert_eq!(stats.recent_activities[0].kind.as_deref(), Some("template"));
}

#[test]
fn dashboard_statistics_tolerate_missing_sections() {
    let stats: DashboardStatistics = serde_json::from_str("{}").unwrap();
    assert_eq!(stats, DashboardStatistics::default());
}
