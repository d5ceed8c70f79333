//! Tests for built-in connectors

use super::quicksight::{Keying, Operation, OPERATIONS};
use super::*;
use crate::loader::{build_client, build_streams, load_connector, validate_connector};
use crate::pagination::PaginationConfig;
use crate::slice::SliceConfig;
use crate::stream::ReadOptions;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_list_builtin_is_sorted_and_complete() {
    assert_eq!(
        list_builtin(),
        vec![
            "crowdstrike",
            "desktop-central",
            "quicksight",
            "robin",
            "snipeit",
            "zoho-recruit"
        ]
    );
}

#[test_case("robin", "organization")]
#[test_case("desktop-central", "computers")]
#[test_case("crowdstrike", "detects")]
#[test_case("snipeit", "hardware")]
#[test_case("zoho-recruit", "modules")]
#[test_case("quicksight", "list_dashboards")]
fn test_builtin_loads_and_validates(name: &str, stream: &str) {
    let def = load_connector(name).unwrap();
    assert!(def.stream(stream).is_some(), "{name} lacks {stream}");
    assert!(is_builtin(name));
}

#[test]
fn test_unknown_builtin() {
    assert!(load_builtin("nope").is_none());
    assert!(get_builtin("quicksight").is_none());
    assert!(!is_builtin("nope"));
}

#[test]
fn test_builtin_info_covers_every_connector() {
    let info = list_builtin_info();
    assert_eq!(info.len(), list_builtin().len());
    let quicksight = info.iter().find(|i| i.name == "quicksight").unwrap();
    assert_eq!(quicksight.streams, OPERATIONS.len());
}

// ============================================================================
// QuickSight
// ============================================================================

/// Read one QuickSight stream against the mock server with test credentials
async fn read_quicksight(server: &MockServer, stream: &str) -> Vec<serde_json::Value> {
    let mut def = quicksight::definition();
    def.base_url = server.uri();
    def.http.rate_limit_rps = None;
    def.http.max_retries = 0;
    let config = json!({
        "aws_access_key_id": "AKIDEXAMPLE",
        "aws_secret_access_key": "secret",
        "aws_region_name": "us-east-1",
        "aws_account_id": "123456789012"
    });
    let client = build_client(&def, &config).unwrap();
    let streams = build_streams(&def, &config, &client).unwrap();

    streams
        .iter()
        .find(|s| s.name() == stream)
        .unwrap()
        .read(None, ReadOptions::default())
        .collect_all()
        .await
        .unwrap()
}

#[test]
fn test_quicksight_definition_is_valid() {
    let def = quicksight::definition();
    validate_connector(&def).unwrap();
    assert_eq!(def.streams.len(), OPERATIONS.len());
    assert_eq!(
        def.check.as_ref().and_then(|c| c.stream.as_deref()),
        Some("describe_account_settings")
    );
}

#[test]
fn test_quicksight_namespace_keying() {
    let spec = Operation::ListGroups.spec();
    let (parent, keying) = spec.parent.unwrap();
    assert_eq!(parent, Operation::ListNamespaces);
    assert_eq!(
        keying,
        &[Keying {
            field: "Name",
            key: "Namespace"
        }]
    );
}

#[test]
fn test_quicksight_list_operations_page_with_next_token() {
    let def = Operation::ListDashboards.stream_definition();
    match def.pagination {
        PaginationConfig::NextToken {
            token_path,
            token_param,
            page_size_param,
            page_size,
        } => {
            assert_eq!(token_path, "NextToken");
            assert_eq!(token_param, "next-token");
            assert_eq!(page_size_param.as_deref(), Some("max-results"));
            assert_eq!(page_size, Some(100));
        }
        other => panic!("unexpected pagination {other:?}"),
    }
    assert_eq!(
        Operation::DescribeDashboard.stream_definition().pagination,
        PaginationConfig::None
    );
}

#[test]
fn test_quicksight_describe_data_set_suppresses_unavailable() {
    let def = Operation::DescribeDataSet.stream_definition();
    assert_eq!(def.suppress_http_errors, vec![400, 403, 404]);
    assert!(matches!(def.slicing, Some(SliceConfig::Parent { ref stream, .. }) if stream == "list_data_sets"));
}

#[tokio::test]
async fn test_quicksight_group_memberships_join_namespace_and_group() {
    let server = MockServer::start().await;
    let account = "/accounts/123456789012";

    Mock::given(method("GET"))
        .and(path(format!("{account}/namespaces")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Namespaces": [{"Name": "default"}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{account}/namespaces/default/groups")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "GroupList": [{"GroupName": "admins"}, {"GroupName": "readers"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{account}/namespaces/default/groups/admins/members")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "GroupMemberList": [{"MemberName": "alice"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{account}/namespaces/default/groups/readers/members")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "GroupMemberList": [{"MemberName": "bob"}, {"MemberName": "carol"}]
        })))
        .mount(&server)
        .await;

    let mut records = read_quicksight(&server, "list_group_memberships").await;
    records.sort_by_key(|r| r["MemberName"].as_str().map(str::to_string));

    assert_eq!(
        records,
        vec![
            json!({"MemberName": "alice", "Namespace": "default", "GroupName": "admins"}),
            json!({"MemberName": "bob", "Namespace": "default", "GroupName": "readers"}),
            json!({"MemberName": "carol", "Namespace": "default", "GroupName": "readers"}),
        ]
    );
}

#[test]
fn test_quicksight_signs_for_its_region() {
    let def = quicksight::definition();
    assert_eq!(
        def.base_url,
        "https://quicksight.{{ config.aws_region_name }}.amazonaws.com"
    );
    assert!(matches!(
        def.auth,
        crate::loader::AuthDefinition::AwsSigv4 { ref service, .. } if service == "quicksight"
    ));
    let secret = def
        .config
        .iter()
        .find(|f| f.name == "aws_secret_access_key")
        .unwrap();
    assert!(secret.secret && secret.required);
}

#[test_case(Operation::DescribeGroupMembership, Operation::ListGroupMemberships, &["Namespace", "GroupName", "MemberName"])]
#[test_case(Operation::DescribeIngestion, Operation::ListIngestions, &["DataSetId", "IngestionId"])]
#[test_case(Operation::DescribeTemplateAlias, Operation::ListTemplateAliases, &["TemplateId", "AliasName"])]
#[test_case(Operation::DescribeThemeAlias, Operation::ListThemeAliases, &["ThemeId", "AliasName"])]
#[test_case(Operation::DescribeUser, Operation::ListUsers, &["Namespace", "UserName"])]
#[test_case(Operation::DescribeIamPolicyAssignment, Operation::ListIamPolicyAssignments, &["Namespace", "AssignmentName"])]
fn test_quicksight_describe_keyed_by_listing(op: Operation, listing: Operation, keys: &[&str]) {
    let (parent, keying) = op.spec().parent.unwrap();
    assert_eq!(parent, listing);
    let slice_keys: Vec<&str> = keying.iter().map(|k| k.key).collect();
    assert_eq!(slice_keys, keys);

    // The parent is declared first, so it exists when the child is wired
    let position = |o: Operation| OPERATIONS.iter().position(|x| *x == o).unwrap();
    assert!(position(listing) < position(op));
}

#[tokio::test]
async fn test_quicksight_requests_are_signed_and_names_escaped() {
    let server = MockServer::start().await;
    let account = "/accounts/123456789012";

    Mock::given(method("GET"))
        .and(path(format!("{account}/namespaces")))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Namespaces": [{"Name": "default"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{account}/namespaces/default/groups")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "GroupList": [{"GroupName": "Team #2/ops"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{account}/namespaces/default/groups/Team%20%232%2Fops")))
        .and(header_exists("x-amz-date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Group": {"GroupName": "Team #2/ops", "PrincipalId": "p-1"},
            "RequestId": "r-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = read_quicksight(&server, "describe_group").await;
    assert_eq!(
        records,
        vec![json!({"GroupName": "Team #2/ops", "PrincipalId": "p-1", "Namespace": "default"})]
    );

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"))));
}
