//! User/hashtag/mention graph flattened for a client-side force layout.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::SocialPost;

pub const MAX_NODE_WEIGHT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphNodeType {
    User,
    Hashtag,
    Mention,
}

impl GraphNodeType {
    pub fn prefix(&self) -> &'static str {
        match self {
            GraphNodeType::User => "user",
            GraphNodeType::Hashtag => "hashtag",
            GraphNodeType::Mention => "mention",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            GraphNodeType::User => "#6366f1",
            GraphNodeType::Hashtag => "#22c55e",
            GraphNodeType::Mention => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: GraphNodeType,
    pub weight: u32,
    pub connections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub background: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: GraphNodeType,
    pub data: NodeData,
    pub style: NodeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub stroke: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub animated: bool,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

struct PendingNode {
    label: String,
    node_type: GraphNodeType,
    connections: u32,
}

/// Single pass graph construction. Nodes keep first-seen order; edges are
/// deduplicated by `"{source}-{target}-{kind}"`, but every occurrence still
/// counts as a connection on both endpoints.
#[derive(Default)]
pub struct NetworkBuilder {
    order: Vec<String>,
    nodes: HashMap<String, PendingNode>,
    edges: Vec<GraphEdge>,
    edge_ids: HashSet<String>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_node(&mut self, node_type: GraphNodeType, label: &str) -> String {
        let id = format!("{}-{}", node_type.prefix(), label);
        if !self.nodes.contains_key(&id) {
            self.order.push(id.clone());
            self.nodes.insert(
                id.clone(),
                PendingNode {
                    label: label.to_string(),
                    node_type,
                    connections: 0,
                },
            );
        }
        id
    }

    fn add_edge(&mut self, source: &str, target: &str, kind: GraphNodeType) {
        let id = format!("{}-{}-{}", source, target, kind.prefix());
        if self.edge_ids.insert(id.clone()) {
            self.edges.push(GraphEdge {
                id,
                source: source.to_string(),
                target: target.to_string(),
                animated: true,
                style: EdgeStyle {
                    stroke: kind.color().to_string(),
                },
            });
        }
        for endpoint in [source, target] {
            if let Some(node) = self.nodes.get_mut(endpoint) {
                node.connections += 1;
            }
        }
    }

    pub fn add_post(&mut self, post: &SocialPost) {
        let user = self.add_node(GraphNodeType::User, &post.username);
        for hashtag in &post.hashtags {
            let target = self.add_node(GraphNodeType::Hashtag, hashtag);
            self.add_edge(&user, &target, GraphNodeType::Hashtag);
        }
        for mention in &post.mentions {
            let target = self.add_node(GraphNodeType::Mention, mention);
            self.add_edge(&user, &target, GraphNodeType::Mention);
        }
    }

    pub fn build(mut self) -> NetworkGraph {
        let nodes = self
            .order
            .iter()
            .filter_map(|id| self.nodes.remove(id).map(|node| (id.clone(), node)))
            .map(|(id, node)| GraphNode {
                id,
                node_type: node.node_type,
                data: NodeData {
                    label: node.label,
                    node_type: node.node_type,
                    weight: (node.connections + 1).min(MAX_NODE_WEIGHT),
                    connections: node.connections,
                },
                style: NodeStyle {
                    background: node.node_type.color().to_string(),
                },
            })
            .collect();
        NetworkGraph {
            nodes,
            edges: self.edges,
        }
    }
}

pub fn build_network<'a>(posts: impl IntoIterator<Item = &'a SocialPost>) -> NetworkGraph {
    let mut builder = NetworkBuilder::new();
    for post in posts {
        builder.add_post(post);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(username: &str, hashtags: &[&str], mentions: &[&str]) -> SocialPost {
        SocialPost {
            username: username.to_string(),
            hashtags: hashtags.iter().map(|s| s.to_string()).collect(),
            mentions: mentions.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn node<'a>(graph: &'a NetworkGraph, id: &str) -> &'a GraphNode {
        graph.nodes.iter().find(|n| n.id == id).unwrap()
    }

    #[test]
    fn test_shared_hashtag_dedupes_edge() {
        let posts = vec![post("warga", &["banjir"], &[]), post("warga", &["banjir"], &[])];
        let graph = build_network(&posts);

        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].id, "user-warga-hashtag-banjir-hashtag");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(node(&graph, "user-warga").data.connections, 2);
        assert_eq!(node(&graph, "hashtag-banjir").data.connections, 2);
        assert_eq!(node(&graph, "hashtag-banjir").data.weight, 3);
    }

    #[test]
    fn test_distinct_authors_get_distinct_edges() {
        let posts = vec![
            post("alice", &["banjir"], &["dkijakarta"]),
            post("bob", &["banjir"], &[]),
        ];
        let graph = build_network(&posts);

        assert_eq!(graph.edges.len(), 3);
        assert_eq!(node(&graph, "hashtag-banjir").data.connections, 2);
        assert_eq!(node(&graph, "user-bob").data.connections, 1);
        let mention_edge = graph.edges.iter().find(|e| e.target == "mention-dkijakarta").unwrap();
        assert_eq!(mention_edge.style.stroke, "#ef4444");
        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["user-alice", "hashtag-banjir", "mention-dkijakarta", "user-bob"]);
    }

    #[test]
    fn test_weight_is_capped() {
        let posts: Vec<_> = (0..15).map(|i| post(&format!("u{}", i), &["jakarta"], &[])).collect();
        let graph = build_network(&posts);
        assert_eq!(node(&graph, "hashtag-jakarta").data.connections, 15);
        assert_eq!(node(&graph, "hashtag-jakarta").data.weight, MAX_NODE_WEIGHT);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(build_network(&Vec::<SocialPost>::new()), NetworkGraph::default());
    }
}
