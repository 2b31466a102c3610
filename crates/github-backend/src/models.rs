use serde::{Deserialize, Serialize};

/// GraphQL request envelope
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: SearchVariables<'a>,
}

/// Variables for the repository search document.
///
/// `after` is always serialized, as `null` for the first page.
#[derive(Debug, Clone, Serialize)]
pub struct SearchVariables<'a> {
    pub after: Option<&'a str>,
}

/// GraphQL response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    pub search: SearchConnection,
}

/// `search` connection: one page of edges plus paging info
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnection {
    pub page_info: PageInfo,
    pub edges: Vec<SearchEdge>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Search edge. The node is kept raw because hits that are not
/// repositories come back as an empty object.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEdge {
    pub node: Option<serde_json::Value>,
}

/// Repository fragment selected by the search document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub id: String,
    pub name: String,
    pub owner: RepositoryOwner,
    pub stargazer_count: i64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}
