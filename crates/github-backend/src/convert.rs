//! Conversions from GraphQL search payloads to crawler-core types

use crawler_core::{Page, Repository};

use crate::error::Result;
use crate::models::*;

/// Convert a repository node to a crawler-core Repository
pub fn repository_node_to_core(node: RepositoryNode) -> Repository {
    Repository {
        id: node.id,
        name: node.name,
        owner: node.owner.login,
        stars: node.stargazer_count,
        url: node.url,
    }
}

/// Convert a search connection to a Page, keeping edge order.
///
/// Null and empty nodes (non-repository hits) are skipped. Any other node
/// that does not match the repository fragment is a parse error.
pub fn search_connection_to_page(connection: SearchConnection) -> Result<Page> {
    let mut repositories = Vec::with_capacity(connection.edges.len());

    for edge in connection.edges {
        let node = match edge.node {
            Some(serde_json::Value::Object(map)) if map.is_empty() => continue,
            Some(serde_json::Value::Null) | None => continue,
            Some(value) => value,
        };
        let node: RepositoryNode = serde_json::from_value(node)?;
        repositories.push(repository_node_to_core(node));
    }

    Ok(Page {
        repositories,
        end_cursor: connection.page_info.end_cursor,
        has_next_page: connection.page_info.has_next_page,
    })
}
