//! Figures shown by the dashboard, analytics and collections views.

use std::fmt;

use serde_json::Value;

use crate::discovery::CollectionSet;

/// Items listed in the dashboard's recent-data table.
pub const RECENT_ITEM_LIMIT: usize = 10;

/// One row of the recent-data table.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentItem {
    pub collection: String,
    pub key: String,
    pub data: Value,
}

/// Dashboard figures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_collections: usize,
    pub total_items: usize,
    /// First [`RECENT_ITEM_LIMIT`] items in snapshot order
    pub recent: Vec<RecentItem>,
}

impl DashboardSummary {
    pub fn from_snapshot(snapshot: &CollectionSet) -> Self {
        let recent = snapshot
            .iter()
            .flat_map(|(collection, items)| {
                items.iter().map(move |(key, data)| RecentItem {
                    collection: collection.clone(),
                    key: key.clone(),
                    data: data.clone(),
                })
            })
            .take(RECENT_ITEM_LIMIT)
            .collect();

        Self {
            total_collections: snapshot.len(),
            total_items: snapshot.total_items(),
            recent,
        }
    }
}

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Collections: {}  Items: {}",
            self.total_collections, self.total_items
        )?;
        if self.recent.is_empty() {
            return writeln!(f, "No data yet");
        }
        for item in &self.recent {
            writeln!(f, "  [{}] {}", item.collection, item.key)?;
        }
        Ok(())
    }
}

/// Analytics figures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsSummary {
    /// Item count per collection, by name
    pub distribution: Vec<(String, usize)>,
    pub total_collections: usize,
    pub total_items: usize,
    /// Collection with the most items; the first one wins ties
    pub largest: Option<(String, usize)>,
}

impl AnalyticsSummary {
    pub fn from_snapshot(snapshot: &CollectionSet) -> Self {
        let distribution: Vec<(String, usize)> = snapshot
            .iter()
            .map(|(name, items)| (name.clone(), items.len()))
            .collect();

        let mut largest: Option<(String, usize)> = None;
        for (name, count) in &distribution {
            if *count > largest.as_ref().map_or(0, |(_, c)| *c) {
                largest = Some((name.clone(), *count));
            }
        }

        Self {
            total_collections: distribution.len(),
            total_items: distribution.iter().map(|(_, c)| c).sum(),
            distribution,
            largest,
        }
    }
}

impl fmt::Display for AnalyticsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.distribution.is_empty() {
            return writeln!(f, "No Data Yet");
        }
        let width = self
            .distribution
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);
        for (name, count) in &self.distribution {
            writeln!(f, "  {:<width$} {:>5} {}", name, count, "#".repeat((*count).min(50)))?;
        }
        match &self.largest {
            Some((name, count)) => writeln!(
                f,
                "Collections: {}  Items: {}  Largest: {} ({})",
                self.total_collections, self.total_items, name, count
            ),
            None => writeln!(
                f,
                "Collections: {}  Items: {}  Largest: N/A",
                self.total_collections, self.total_items
            ),
        }
    }
}

/// One row of the collections table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRow {
    pub name: String,
    pub items: usize,
}

pub fn collection_rows(snapshot: &CollectionSet) -> Vec<CollectionRow> {
    snapshot
        .iter()
        .map(|(name, items)| CollectionRow {
            name: name.clone(),
            items: items.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> CollectionSet {
        let mut set = CollectionSet::new();
        let sensors = json!({"s1": 1, "s2": 2, "s3": 3});
        let todos = json!({"t1": {"done": false}, "t2": {"done": true}, "t3": {}});
        let presses = json!({"p1": {"timestamp": 1}});
        set.insert("sensors", sensors.as_object().unwrap().clone());
        set.insert("todos", todos.as_object().unwrap().clone());
        set.insert("presses", presses.as_object().unwrap().clone());
        set
    }

    #[test]
    fn test_dashboard_counts() {
        let summary = DashboardSummary::from_snapshot(&snapshot());
        assert_eq!(summary.total_collections, 3);
        assert_eq!(summary.total_items, 7);
        assert_eq!(summary.recent.len(), 7);
        assert_eq!(summary.recent[0].collection, "presses");
        assert!(summary.to_string().contains("Collections: 3  Items: 7"));
    }

    #[test]
    fn test_dashboard_recent_is_capped() {
        let mut set = CollectionSet::new();
        let mut items = serde_json::Map::new();
        for i in 0..25 {
            items.insert(format!("k{:02}", i), json!(i));
        }
        set.insert("big", items);

        let summary = DashboardSummary::from_snapshot(&set);
        assert_eq!(summary.recent.len(), RECENT_ITEM_LIMIT);
        assert_eq!(summary.total_items, 25);
    }

    #[test]
    fn test_analytics_largest_first_wins_ties() {
        let summary = AnalyticsSummary::from_snapshot(&snapshot());
        assert_eq!(
            summary.distribution,
            vec![
                ("presses".to_string(), 1),
                ("sensors".to_string(), 3),
                ("todos".to_string(), 3),
            ]
        );
        assert_eq!(summary.largest, Some(("sensors".to_string(), 3)));
        assert_eq!(summary.total_items, 7);
    }

    #[test]
    fn test_empty_snapshot() {
        let empty = CollectionSet::new();
        let analytics = AnalyticsSummary::from_snapshot(&empty);
        assert!(analytics.largest.is_none());
        assert_eq!(analytics.to_string(), "No Data Yet\n");
        assert_eq!(
            DashboardSummary::from_snapshot(&empty).to_string(),
            "Collections: 0  Items: 0\nNo data yet\n"
        );
        assert!(collection_rows(&empty).is_empty());
    }

    #[test]
    fn test_collection_rows() {
        let rows = collection_rows(&snapshot());
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            CollectionRow {
                name: "sensors".to_string(),
                items: 3
            }
        );
    }
}
