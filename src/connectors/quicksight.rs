//! Amazon QuickSight, generated from an operation table
//!
//! Every stream is one QuickSight REST operation. Child operations name the
//! parent operation they fan out over and how a parent record keys them.
//! Requests go straight to the regional endpoint, signed with SigV4 from the
//! configured access key.

use crate::extract::{FieldTransform, ResponseShape};
use crate::loader::{
    AuthDefinition, CheckDefinition, ConfigFieldDefinition, ConnectorDefinition, HttpDefinition,
    RequestDefinition, StreamDefinition,
};
use crate::pagination::PaginationConfig;
use crate::slice::{SliceConfig, SliceProjection};
use crate::types::Method;
use std::collections::BTreeMap;

pub const NAME: &str = "quicksight";

macro_rules! account {
    ($suffix:literal) => {
        concat!("/accounts/{{ config.aws_account_id }}", $suffix)
    };
}

/// QuickSight operations exposed as streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DescribeAccountSettings,
    DescribeAccountSubscription,
    DescribeIpRestriction,
    ListDashboards,
    ListDashboardVersions,
    DescribeDashboard,
    DescribeDashboardDefinition,
    DescribeDashboardPermissions,
    ListAnalyses,
    DescribeAnalysis,
    DescribeAnalysisDefinition,
    DescribeAnalysisPermissions,
    ListDataSets,
    DescribeDataSet,
    DescribeDataSetPermissions,
    ListIngestions,
    DescribeIngestion,
    ListDataSources,
    DescribeDataSource,
    DescribeDataSourcePermissions,
    ListFolders,
    DescribeFolder,
    DescribeFolderPermissions,
    DescribeFolderResolvedPermissions,
    ListFolderMembers,
    ListNamespaces,
    DescribeNamespace,
    ListGroups,
    DescribeGroup,
    ListGroupMemberships,
    DescribeGroupMembership,
    ListUsers,
    DescribeUser,
    ListIamPolicyAssignments,
    DescribeIamPolicyAssignment,
    ListTemplates,
    DescribeTemplate,
    DescribeTemplateDefinition,
    DescribeTemplatePermissions,
    ListTemplateAliases,
    DescribeTemplateAlias,
    ListTemplateVersions,
    ListThemes,
    DescribeTheme,
    DescribeThemePermissions,
    ListThemeAliases,
    DescribeThemeAlias,
    ListThemeVersions,
}

/// Every operation, parents before children
pub const OPERATIONS: &[Operation] = &[
    Operation::DescribeAccountSettings,
    Operation::DescribeAccountSubscription,
    Operation::DescribeIpRestriction,
    Operation::ListDashboards,
    Operation::ListDashboardVersions,
    Operation::DescribeDashboard,
    Operation::DescribeDashboardDefinition,
    Operation::DescribeDashboardPermissions,
    Operation::ListAnalyses,
    Operation::DescribeAnalysis,
    Operation::DescribeAnalysisDefinition,
    Operation::DescribeAnalysisPermissions,
    Operation::ListDataSets,
    Operation::DescribeDataSet,
    Operation::DescribeDataSetPermissions,
    Operation::ListIngestions,
    Operation::DescribeIngestion,
    Operation::ListDataSources,
    Operation::DescribeDataSource,
    Operation::DescribeDataSourcePermissions,
    Operation::ListFolders,
    Operation::DescribeFolder,
    Operation::DescribeFolderPermissions,
    Operation::DescribeFolderResolvedPermissions,
    Operation::ListFolderMembers,
    Operation::ListNamespaces,
    Operation::DescribeNamespace,
    Operation::ListGroups,
    Operation::DescribeGroup,
    Operation::ListGroupMemberships,
    Operation::DescribeGroupMembership,
    Operation::ListUsers,
    Operation::DescribeUser,
    Operation::ListIamPolicyAssignments,
    Operation::DescribeIamPolicyAssignment,
    Operation::ListTemplates,
    Operation::DescribeTemplate,
    Operation::DescribeTemplateDefinition,
    Operation::DescribeTemplatePermissions,
    Operation::ListTemplateAliases,
    Operation::DescribeTemplateAlias,
    Operation::ListTemplateVersions,
    Operation::ListThemes,
    Operation::DescribeTheme,
    Operation::DescribeThemePermissions,
    Operation::ListThemeAliases,
    Operation::DescribeThemeAlias,
    Operation::ListThemeVersions,
];

/// Which parent field feeds which slice key.
///
/// Most operations reuse the parent's id field name as the key. Namespaces
/// are the exception: the record field is `Name` but requests need
/// `Namespace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keying {
    pub field: &'static str,
    pub key: &'static str,
}

impl Keying {
    const fn same(name: &'static str) -> Self {
        Self {
            field: name,
            key: name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Array under the envelope, paged with `NextToken`
    PagedList(&'static str),
    /// One object under the envelope, or the whole body
    Single(Option<&'static str>),
}

/// Table row for one operation
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    pub path: &'static str,
    pub shape: Shape,
    pub primary_key: &'static [&'static str],
    pub parent: Option<(Operation, &'static [Keying])>,
    /// Slice keys copied into every record
    pub stamp: &'static [&'static str],
    pub suppress: &'static [u16],
}

const DASHBOARD: &[Keying] = &[Keying::same("DashboardId")];
const ANALYSIS: &[Keying] = &[Keying::same("AnalysisId")];
const DATA_SET: &[Keying] = &[Keying::same("DataSetId")];
const DATA_SOURCE: &[Keying] = &[Keying::same("DataSourceId")];
const FOLDER: &[Keying] = &[Keying::same("FolderId")];
const NAMESPACE: &[Keying] = &[Keying {
    field: "Name",
    key: "Namespace",
}];
const GROUP: &[Keying] = &[Keying::same("Namespace"), Keying::same("GroupName")];
const MEMBER: &[Keying] = &[
    Keying::same("Namespace"),
    Keying::same("GroupName"),
    Keying::same("MemberName"),
];
const USER: &[Keying] = &[Keying::same("Namespace"), Keying::same("UserName")];
const ASSIGNMENT: &[Keying] = &[Keying::same("Namespace"), Keying::same("AssignmentName")];
const INGESTION: &[Keying] = &[Keying::same("DataSetId"), Keying::same("IngestionId")];
const TEMPLATE: &[Keying] = &[Keying::same("TemplateId")];
const TEMPLATE_ALIAS: &[Keying] = &[Keying::same("TemplateId"), Keying::same("AliasName")];
const THEME: &[Keying] = &[Keying::same("ThemeId")];
const THEME_ALIAS: &[Keying] = &[Keying::same("ThemeId"), Keying::same("AliasName")];

/// Data sets built from file uploads cannot be described through the API
const UNDESCRIBABLE: &[u16] = &[400, 403, 404];

impl Operation {
    pub fn stream_name(self) -> &'static str {
        match self {
            Operation::DescribeAccountSettings => "describe_account_settings",
            Operation::DescribeAccountSubscription => "describe_account_subscription",
            Operation::DescribeIpRestriction => "describe_ip_restriction",
            Operation::ListDashboards => "list_dashboards",
            Operation::ListDashboardVersions => "list_dashboard_versions",
            Operation::DescribeDashboard => "describe_dashboard",
            Operation::DescribeDashboardDefinition => "describe_dashboard_definition",
            Operation::DescribeDashboardPermissions => "describe_dashboard_permissions",
            Operation::ListAnalyses => "list_analyses",
            Operation::DescribeAnalysis => "describe_analysis",
            Operation::DescribeAnalysisDefinition => "describe_analysis_definition",
            Operation::DescribeAnalysisPermissions => "describe_analysis_permissions",
            Operation::ListDataSets => "list_data_sets",
            Operation::DescribeDataSet => "describe_data_set",
            Operation::DescribeDataSetPermissions => "describe_data_set_permissions",
            Operation::ListIngestions => "list_ingestions",
            Operation::DescribeIngestion => "describe_ingestion",
            Operation::ListDataSources => "list_data_sources",
            Operation::DescribeDataSource => "describe_data_source",
            Operation::DescribeDataSourcePermissions => "describe_data_source_permissions",
            Operation::ListFolders => "list_folders",
            Operation::DescribeFolder => "describe_folder",
            Operation::DescribeFolderPermissions => "describe_folder_permissions",
            Operation::DescribeFolderResolvedPermissions => "describe_folder_resolved_permissions",
            Operation::ListFolderMembers => "list_folder_members",
            Operation::ListNamespaces => "list_namespaces",
            Operation::DescribeNamespace => "describe_namespace",
            Operation::ListGroups => "list_groups",
            Operation::DescribeGroup => "describe_group",
            Operation::ListGroupMemberships => "list_group_memberships",
            Operation::DescribeGroupMembership => "describe_group_membership",
            Operation::ListUsers => "list_users",
            Operation::DescribeUser => "describe_user",
            Operation::ListIamPolicyAssignments => "list_iam_policy_assignments",
            Operation::DescribeIamPolicyAssignment => "describe_iam_policy_assignment",
            Operation::ListTemplates => "list_templates",
            Operation::DescribeTemplate => "describe_template",
            Operation::DescribeTemplateDefinition => "describe_template_definition",
            Operation::DescribeTemplatePermissions => "describe_template_permissions",
            Operation::ListTemplateAliases => "list_template_aliases",
            Operation::DescribeTemplateAlias => "describe_template_alias",
            Operation::ListTemplateVersions => "list_template_versions",
            Operation::ListThemes => "list_themes",
            Operation::DescribeTheme => "describe_theme",
            Operation::DescribeThemePermissions => "describe_theme_permissions",
            Operation::ListThemeAliases => "list_theme_aliases",
            Operation::DescribeThemeAlias => "describe_theme_alias",
            Operation::ListThemeVersions => "list_theme_versions",
        }
    }

    pub fn spec(self) -> OperationSpec {
        use Shape::{PagedList, Single};

        let top = |path, shape, primary_key| OperationSpec {
            path,
            shape,
            primary_key,
            parent: None,
            stamp: &[],
            suppress: &[],
        };
        let child = |path, shape, primary_key, parent: Operation, keying: &'static [Keying]| {
            OperationSpec {
                path,
                shape,
                primary_key,
                parent: Some((parent, keying)),
                stamp: &[],
                suppress: &[],
            }
        };

        match self {
            Operation::DescribeAccountSettings => {
                top(account!("/settings"), Single(Some("AccountSettings")), &[])
            }
            Operation::DescribeAccountSubscription => top(
                "/account/{{ config.aws_account_id }}",
                Single(Some("AccountInfo")),
                &[],
            ),
            Operation::DescribeIpRestriction => {
                top(account!("/ip-restriction"), Single(None), &[])
            }

            Operation::ListDashboards => top(
                account!("/dashboards"),
                PagedList("DashboardSummaryList"),
                &["DashboardId"],
            ),
            Operation::ListDashboardVersions => OperationSpec {
                stamp: &["DashboardId"],
                ..child(
                    account!("/dashboards/{{ slice.DashboardId }}/versions"),
                    PagedList("DashboardVersionSummaryList"),
                    &["DashboardId", "VersionNumber"],
                    Operation::ListDashboards,
                    DASHBOARD,
                )
            },
            Operation::DescribeDashboard => child(
                account!("/dashboards/{{ slice.DashboardId }}"),
                Single(Some("Dashboard")),
                &["DashboardId"],
                Operation::ListDashboards,
                DASHBOARD,
            ),
            Operation::DescribeDashboardDefinition => child(
                account!("/dashboards/{{ slice.DashboardId }}/definition"),
                Single(None),
                &["DashboardId"],
                Operation::ListDashboards,
                DASHBOARD,
            ),
            Operation::DescribeDashboardPermissions => child(
                account!("/dashboards/{{ slice.DashboardId }}/permissions"),
                Single(None),
                &["DashboardId"],
                Operation::ListDashboards,
                DASHBOARD,
            ),

            Operation::ListAnalyses => top(
                account!("/analyses"),
                PagedList("AnalysisSummaryList"),
                &["AnalysisId"],
            ),
            Operation::DescribeAnalysis => child(
                account!("/analyses/{{ slice.AnalysisId }}"),
                Single(Some("Analysis")),
                &["AnalysisId"],
                Operation::ListAnalyses,
                ANALYSIS,
            ),
            Operation::DescribeAnalysisDefinition => child(
                account!("/analyses/{{ slice.AnalysisId }}/definition"),
                Single(None),
                &["AnalysisId"],
                Operation::ListAnalyses,
                ANALYSIS,
            ),
            Operation::DescribeAnalysisPermissions => child(
                account!("/analyses/{{ slice.AnalysisId }}/permissions"),
                Single(None),
                &["AnalysisId"],
                Operation::ListAnalyses,
                ANALYSIS,
            ),

            Operation::ListDataSets => top(
                account!("/data-sets"),
                PagedList("DataSetSummaries"),
                &["DataSetId"],
            ),
            Operation::DescribeDataSet => OperationSpec {
                suppress: UNDESCRIBABLE,
                ..child(
                    account!("/data-sets/{{ slice.DataSetId }}"),
                    Single(Some("DataSet")),
                    &["DataSetId"],
                    Operation::ListDataSets,
                    DATA_SET,
                )
            },
            Operation::DescribeDataSetPermissions => OperationSpec {
                suppress: UNDESCRIBABLE,
                ..child(
                    account!("/data-sets/{{ slice.DataSetId }}/permissions"),
                    Single(None),
                    &["DataSetId"],
                    Operation::ListDataSets,
                    DATA_SET,
                )
            },
            Operation::ListIngestions => OperationSpec {
                stamp: &["DataSetId"],
                suppress: UNDESCRIBABLE,
                ..child(
                    account!("/data-sets/{{ slice.DataSetId }}/ingestions"),
                    PagedList("Ingestions"),
                    &["DataSetId", "IngestionId"],
                    Operation::ListDataSets,
                    DATA_SET,
                )
            },
            Operation::DescribeIngestion => OperationSpec {
                stamp: &["DataSetId"],
                suppress: UNDESCRIBABLE,
                ..child(
                    account!("/data-sets/{{ slice.DataSetId }}/ingestions/{{ slice.IngestionId }}"),
                    Single(Some("Ingestion")),
                    &["DataSetId", "IngestionId"],
                    Operation::ListIngestions,
                    INGESTION,
                )
            },

            Operation::ListDataSources => top(
                account!("/data-sources"),
                PagedList("DataSources"),
                &["DataSourceId"],
            ),
            Operation::DescribeDataSource => child(
                account!("/data-sources/{{ slice.DataSourceId }}"),
                Single(Some("DataSource")),
                &["DataSourceId"],
                Operation::ListDataSources,
                DATA_SOURCE,
            ),
            Operation::DescribeDataSourcePermissions => child(
                account!("/data-sources/{{ slice.DataSourceId }}/permissions"),
                Single(None),
                &["DataSourceId"],
                Operation::ListDataSources,
                DATA_SOURCE,
            ),

            Operation::ListFolders => top(
                account!("/folders"),
                PagedList("FolderSummaryList"),
                &["FolderId"],
            ),
            Operation::DescribeFolder => child(
                account!("/folders/{{ slice.FolderId }}"),
                Single(Some("Folder")),
                &["FolderId"],
                Operation::ListFolders,
                FOLDER,
            ),
            Operation::DescribeFolderPermissions => child(
                account!("/folders/{{ slice.FolderId }}/permissions"),
                Single(None),
                &["FolderId"],
                Operation::ListFolders,
                FOLDER,
            ),
            Operation::DescribeFolderResolvedPermissions => child(
                account!("/folders/{{ slice.FolderId }}/resolved-permissions"),
                Single(None),
                &["FolderId"],
                Operation::ListFolders,
                FOLDER,
            ),
            Operation::ListFolderMembers => OperationSpec {
                stamp: &["FolderId"],
                ..child(
                    account!("/folders/{{ slice.FolderId }}/members"),
                    PagedList("FolderMemberList"),
                    &["FolderId", "MemberId"],
                    Operation::ListFolders,
                    FOLDER,
                )
            },

            Operation::ListNamespaces => top(
                account!("/namespaces"),
                PagedList("Namespaces"),
                &["Name"],
            ),
            Operation::DescribeNamespace => child(
                account!("/namespaces/{{ slice.Namespace }}"),
                Single(Some("Namespace")),
                &["Name"],
                Operation::ListNamespaces,
                NAMESPACE,
            ),
            Operation::ListGroups => OperationSpec {
                stamp: &["Namespace"],
                ..child(
                    account!("/namespaces/{{ slice.Namespace }}/groups"),
                    PagedList("GroupList"),
                    &["Namespace", "GroupName"],
                    Operation::ListNamespaces,
                    NAMESPACE,
                )
            },
            Operation::DescribeGroup => OperationSpec {
                stamp: &["Namespace"],
                ..child(
                    account!("/namespaces/{{ slice.Namespace }}/groups/{{ slice.GroupName }}"),
                    Single(Some("Group")),
                    &["Namespace", "GroupName"],
                    Operation::ListGroups,
                    GROUP,
                )
            },
            Operation::ListGroupMemberships => OperationSpec {
                stamp: &["Namespace", "GroupName"],
                ..child(
                    account!("/namespaces/{{ slice.Namespace }}/groups/{{ slice.GroupName }}/members"),
                    PagedList("GroupMemberList"),
                    &["Namespace", "GroupName", "MemberName"],
                    Operation::ListGroups,
                    GROUP,
                )
            },
            Operation::DescribeGroupMembership => OperationSpec {
                stamp: &["Namespace", "GroupName"],
                ..child(
                    account!(
                        "/namespaces/{{ slice.Namespace }}/groups/{{ slice.GroupName }}/members/{{ slice.MemberName }}"
                    ),
                    Single(Some("GroupMember")),
                    &["Namespace", "GroupName", "MemberName"],
                    Operation::ListGroupMemberships,
                    MEMBER,
                )
            },
            Operation::ListUsers => OperationSpec {
                stamp: &["Namespace"],
                ..child(
                    account!("/namespaces/{{ slice.Namespace }}/users"),
                    PagedList("UserList"),
                    &["Namespace", "UserName"],
                    Operation::ListNamespaces,
                    NAMESPACE,
                )
            },
            Operation::DescribeUser => OperationSpec {
                stamp: &["Namespace"],
                ..child(
                    account!("/namespaces/{{ slice.Namespace }}/users/{{ slice.UserName }}"),
                    Single(Some("User")),
                    &["Namespace", "UserName"],
                    Operation::ListUsers,
                    USER,
                )
            },
            Operation::ListIamPolicyAssignments => OperationSpec {
                stamp: &["Namespace"],
                ..child(
                    account!("/namespaces/{{ slice.Namespace }}/v2/iam-policy-assignments"),
                    PagedList("IAMPolicyAssignments"),
                    &["Namespace", "AssignmentName"],
                    Operation::ListNamespaces,
                    NAMESPACE,
                )
            },
            Operation::DescribeIamPolicyAssignment => OperationSpec {
                stamp: &["Namespace"],
                ..child(
                    account!(
                        "/namespaces/{{ slice.Namespace }}/iam-policy-assignments/{{ slice.AssignmentName }}"
                    ),
                    Single(Some("IAMPolicyAssignment")),
                    &["Namespace", "AssignmentName"],
                    Operation::ListIamPolicyAssignments,
                    ASSIGNMENT,
                )
            },

            Operation::ListTemplates => top(
                account!("/templates"),
                PagedList("TemplateSummaryList"),
                &["TemplateId"],
            ),
            Operation::DescribeTemplate => child(
                account!("/templates/{{ slice.TemplateId }}"),
                Single(Some("Template")),
                &["TemplateId"],
                Operation::ListTemplates,
                TEMPLATE,
            ),
            Operation::DescribeTemplateDefinition => child(
                account!("/templates/{{ slice.TemplateId }}/definition"),
                Single(None),
                &["TemplateId"],
                Operation::ListTemplates,
                TEMPLATE,
            ),
            Operation::DescribeTemplatePermissions => child(
                account!("/templates/{{ slice.TemplateId }}/permissions"),
                Single(None),
                &["TemplateId"],
                Operation::ListTemplates,
                TEMPLATE,
            ),
            Operation::ListTemplateAliases => OperationSpec {
                stamp: &["TemplateId"],
                ..child(
                    account!("/templates/{{ slice.TemplateId }}/aliases"),
                    PagedList("TemplateAliasList"),
                    &["TemplateId", "AliasName"],
                    Operation::ListTemplates,
                    TEMPLATE,
                )
            },
            Operation::DescribeTemplateAlias => OperationSpec {
                stamp: &["TemplateId"],
                ..child(
                    account!("/templates/{{ slice.TemplateId }}/aliases/{{ slice.AliasName }}"),
                    Single(Some("TemplateAlias")),
                    &["TemplateId", "AliasName"],
                    Operation::ListTemplateAliases,
                    TEMPLATE_ALIAS,
                )
            },
            Operation::ListTemplateVersions => OperationSpec {
                stamp: &["TemplateId"],
                ..child(
                    account!("/templates/{{ slice.TemplateId }}/versions"),
                    PagedList("TemplateVersionSummaryList"),
                    &["TemplateId", "VersionNumber"],
                    Operation::ListTemplates,
                    TEMPLATE,
                )
            },

            Operation::ListThemes => top(
                account!("/themes"),
                PagedList("ThemeSummaryList"),
                &["ThemeId"],
            ),
            Operation::DescribeTheme => child(
                account!("/themes/{{ slice.ThemeId }}"),
                Single(Some("Theme")),
                &["ThemeId"],
                Operation::ListThemes,
                THEME,
            ),
            Operation::DescribeThemePermissions => child(
                account!("/themes/{{ slice.ThemeId }}/permissions"),
                Single(None),
                &["ThemeId"],
                Operation::ListThemes,
                THEME,
            ),
            // Built-in themes (CLASSIC, MIDNIGHT, ...) have no aliases and answer 404
            Operation::ListThemeAliases => OperationSpec {
                stamp: &["ThemeId"],
                suppress: &[404],
                ..child(
                    account!("/themes/{{ slice.ThemeId }}/aliases"),
                    PagedList("ThemeAliasList"),
                    &["ThemeId", "AliasName"],
                    Operation::ListThemes,
                    THEME,
                )
            },
            Operation::DescribeThemeAlias => OperationSpec {
                stamp: &["ThemeId"],
                ..child(
                    account!("/themes/{{ slice.ThemeId }}/aliases/{{ slice.AliasName }}"),
                    Single(Some("ThemeAlias")),
                    &["ThemeId", "AliasName"],
                    Operation::ListThemeAliases,
                    THEME_ALIAS,
                )
            },
            Operation::ListThemeVersions => OperationSpec {
                stamp: &["ThemeId"],
                ..child(
                    account!("/themes/{{ slice.ThemeId }}/versions"),
                    PagedList("ThemeVersionSummaryList"),
                    &["ThemeId", "VersionNumber"],
                    Operation::ListThemes,
                    THEME,
                )
            },
        }
    }

    /// The declarative stream this operation becomes
    pub fn stream_definition(self) -> StreamDefinition {
        let spec = self.spec();

        let (response, pagination) = match spec.shape {
            Shape::PagedList(envelope) => (
                ResponseShape::list(envelope),
                PaginationConfig::NextToken {
                    token_path: "NextToken".to_string(),
                    token_param: "next-token".to_string(),
                    page_size_param: Some("max-results".to_string()),
                    page_size: Some(100),
                },
            ),
            Shape::Single(envelope) => (
                ResponseShape::single(envelope.map(str::to_string)),
                PaginationConfig::None,
            ),
        };

        let slicing = spec.parent.map(|(parent, keying)| SliceConfig::Parent {
            stream: parent.stream_name().to_string(),
            fields: keying
                .iter()
                .map(|k| SliceProjection::new(k.field, k.key))
                .collect(),
            exclude: None,
        });

        let transforms = spec
            .stamp
            .iter()
            .map(|key| FieldTransform::StampSlice {
                slice_key: (*key).to_string(),
                field: (*key).to_string(),
            })
            .collect();

        StreamDefinition {
            name: self.stream_name().to_string(),
            primary_key: (!spec.primary_key.is_empty())
                .then(|| spec.primary_key.iter().map(|k| (*k).to_string()).collect()),
            request: RequestDefinition {
                method: Method::GET,
                path: spec.path.to_string(),
                params: BTreeMap::new(),
                slice_params: BTreeMap::new(),
                state_param: None,
                headers: BTreeMap::new(),
                body: None,
            },
            response,
            transforms,
            pagination,
            slicing,
            suppress_http_errors: spec.suppress.to_vec(),
            incremental: None,
        }
    }
}

fn config_field(name: &str, description: &str) -> ConfigFieldDefinition {
    ConfigFieldDefinition {
        name: name.to_string(),
        field_type: "string".to_string(),
        required: true,
        secret: false,
        description: Some(description.to_string()),
        default: None,
    }
}

/// The QuickSight connector definition
pub fn definition() -> ConnectorDefinition {
    ConnectorDefinition {
        name: NAME.to_string(),
        version: "0.1.0".to_string(),
        title: Some("Amazon QuickSight".to_string()),
        description: Some(
            "QuickSight dashboards, analyses, data sets, folders, namespaces, groups and themes"
                .to_string(),
        ),
        base_url: "https://quicksight.{{ config.aws_region_name }}.amazonaws.com".to_string(),
        config: vec![
            config_field("aws_access_key_id", "IAM access key id"),
            ConfigFieldDefinition {
                secret: true,
                ..config_field("aws_secret_access_key", "IAM secret access key")
            },
            config_field("aws_region_name", "Region of the QuickSight account, e.g. us-east-1"),
            config_field("aws_account_id", "AWS account id"),
        ],
        auth: AuthDefinition::AwsSigv4 {
            access_key_id: "{{ config.aws_access_key_id }}".to_string(),
            secret_access_key: "{{ config.aws_secret_access_key }}".to_string(),
            region: "{{ config.aws_region_name }}".to_string(),
            service: "quicksight".to_string(),
            session_token: None,
        },
        http: HttpDefinition {
            max_retries: 5,
            rate_limit_rps: Some(2),
            ..HttpDefinition::default()
        },
        check: Some(CheckDefinition {
            stream: Some(Operation::DescribeAccountSettings.stream_name().to_string()),
            ..CheckDefinition::default()
        }),
        headers: BTreeMap::new(),
        streams: OPERATIONS.iter().map(|op| op.stream_definition()).collect(),
    }
}
