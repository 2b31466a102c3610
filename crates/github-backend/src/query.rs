use crawler_core::PAGE_SIZE;

/// Search filter: every repository with at least one star
pub const STARRED_REPOSITORIES: &str = "stars:>0";

/// Build the repository search document for `search_query`.
///
/// The document takes a single `$after` cursor variable.
pub fn search_document(search_query: &str) -> String {
    format!(
        r#"query ($after: String) {{
  search(query: "{query}", type: REPOSITORY, first: {first}, after: $after) {{
    pageInfo {{
      endCursor
      hasNextPage
    }}
    edges {{
      node {{
        ... on Repository {{
          id
          name
          owner {{
            login
          }}
          stargazerCount
          url
        }}
      }}
    }}
  }}
}}"#,
        query = search_query.replace('\\', "\\\\").replace('"', "\\\""),
        first = PAGE_SIZE,
    )
}
