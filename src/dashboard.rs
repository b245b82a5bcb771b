/// Dashboard data: concurrent fetch of every panel plus client-side keyword
/// aggregation
use std::collections::{HashMap, HashSet};

use crate::api::{ApiClient, HttpTransport};
use crate::error::{AppError, AppResult};
use crate::model::{CategoryStat, DashboardEntry, SourceStat, TimelinePoint, Topics};

pub const TOP_KEYWORDS: usize = 15;
pub const TIMELINE_POINTS: usize = 15;

/// Used when `/topics` cannot be loaded
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Politics",
    "Technology",
    "Sports",
    "Business",
    "Entertainment",
    "Science",
    "Health",
    "World News",
    "Lifestyle",
    "Crime",
    "Other",
];

/// One consistent refresh of every panel. Derived data is recomputed from
/// `articles` each time a snapshot is built and never stored elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub articles: Vec<DashboardEntry>,
    pub categories: Vec<CategoryStat>,
    pub sources: Vec<SourceStat>,
    pub timeline: Vec<TimelinePoint>,
    pub keywords: Vec<(String, usize)>,
}

impl DashboardSnapshot {
    pub fn new(
        articles: Vec<DashboardEntry>,
        categories: Vec<CategoryStat>,
        sources: Vec<SourceStat>,
        timeline: Vec<TimelinePoint>,
    ) -> DashboardSnapshot {
        let keywords = keyword_document_frequency(&articles);
        DashboardSnapshot {
            articles,
            categories,
            sources,
            timeline,
            keywords,
        }
    }

    pub fn top_keywords(&self) -> &[(String, usize)] {
        &self.keywords[..self.keywords.len().min(TOP_KEYWORDS)]
    }

    pub fn recent_timeline(&self) -> &[TimelinePoint] {
        let start = self.timeline.len().saturating_sub(TIMELINE_POINTS);
        &self.timeline[start..]
    }

    pub fn articles_in(&self, category: &str) -> Vec<&DashboardEntry> {
        self.articles
            .iter()
            .filter(|article| article.category == category)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    Loading,
    Ready(DashboardSnapshot),
    /// One failed fetch fails the whole refresh; panels are never half-filled
    Failed(String),
}

impl From<AppResult<DashboardSnapshot>> for DashboardState {
    fn from(result: AppResult<DashboardSnapshot>) -> Self {
        match result {
            Ok(snapshot) => DashboardState::Ready(snapshot),
            Err(e) => {
                log::error!("Dashboard refresh failed: {}", e);
                DashboardState::Failed(e.to_string())
            }
        }
    }
}

/// Number of articles mentioning each keyword at least once, most frequent
/// first, ties alphabetical
pub fn keyword_document_frequency(articles: &[DashboardEntry]) -> Vec<(String, usize)> {
    let counts = articles
        .iter()
        .map(|article| article.keywords.iter().collect::<HashSet<_>>())
        .fold(HashMap::new(), |mut counts, unique| {
            for keyword in unique {
                *counts.entry(keyword.clone()).or_insert(0) += 1;
            }
            counts
        });

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Categories offered by the "move to" selector
pub fn category_choices(topics: Option<&Topics>) -> Vec<String> {
    match topics {
        Some(topics) if !topics.default_topics.is_empty() || !topics.custom_topics.is_empty() => topics
            .default_topics
            .iter()
            .chain(topics.custom_topics.iter())
            .cloned()
            .collect(),
        _ => DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
    }
}

/// Fetch history, category breakdown, source breakdown and timeline concurrently
pub async fn load_dashboard<H: HttpTransport>(api: &ApiClient<H>, token: &str) -> AppResult<DashboardSnapshot> {
    let (articles, categories, sources, timeline) = futures::try_join!(
        api.dashboard(token),
        api.category_analysis(token),
        api.source_analysis(token),
        api.sentiment_timeline(token),
    )?;

    Ok(DashboardSnapshot::new(articles, categories, sources, timeline))
}

/// Move an article, then reload everything so counts and averages agree
pub async fn move_article<H: HttpTransport>(
    api: &ApiClient<H>,
    token: &str,
    article_id: i64,
    new_category: &str,
) -> AppResult<DashboardSnapshot> {
    api.move_article(article_id, new_category, token).await?;
    load_dashboard(api, token).await
}

pub async fn create_topic<H: HttpTransport>(api: &ApiClient<H>, token: &str, name: &str) -> AppResult<DashboardSnapshot> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Enter a topic name.".to_string()));
    }

    api.create_topic(name, token).await?;
    load_dashboard(api, token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, response};
    use reqwest::Method;

    const ARTICLES: &str = r#"[
        {"id": 1, "title": "A", "url": "https://a", "sentiment": 0.5, "keywords": ["economy", "rates", "economy"], "category": "Business"},
        {"id": 2, "title": "B", "url": "https://b", "sentiment": -0.3, "keywords": ["election", "economy"], "category": "Politics"},
        {"id": 3, "title": "C", "url": "https://c", "sentiment": 0.0, "keywords": ["election"], "category": "Politics"}
    ]"#;
    const CATEGORIES: &str = r#"[{"category": "Politics", "article_count": 2, "average_sentiment": -0.15}]"#;
    const SOURCES: &str = r#"[{"source": "Daily", "article_count": 3, "average_sentiment": 0.1}]"#;
    const TIMELINE: &str = r#"[{"date": "2024-05-01", "average_sentiment": 0.2, "article_count": 3}]"#;

    fn create_test_entry(id: i64, keywords: &[&str]) -> DashboardEntry {
        DashboardEntry {
            id,
            title: format!("Article {}", id),
            url: format!("https://news.example.org/{}", id),
            sentiment: 0.0,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            category: "Other".to_string(),
        }
    }

    fn scripted_dashboard() -> ScriptedTransport {
        let transport = ScriptedTransport::new();
        transport.respond(Method::GET, "/dashboard", response(200, ARTICLES));
        transport.respond(Method::GET, "/category_analysis", response(200, CATEGORIES));
        transport.respond(Method::GET, "/source_analysis", response(200, SOURCES));
        transport.respond(Method::GET, "/sentiment_timeline", response(200, TIMELINE));
        transport
    }

    #[test]
    fn test_document_frequency_counts_articles_not_occurrences() {
        let articles = vec![
            create_test_entry(1, &["rust", "rust", "wasm"]),
            create_test_entry(2, &["rust"]),
        ];

        let ranked = keyword_document_frequency(&articles);

        assert_eq!(ranked[0], ("rust".to_string(), 2));
        assert_eq!(ranked[1], ("wasm".to_string(), 1));
    }

    #[test]
    fn test_document_frequency_ties_sorted_alphabetically() {
        let articles = vec![
            create_test_entry(1, &["zebra", "apple"]),
            create_test_entry(2, &["mango"]),
        ];

        let ranked = keyword_document_frequency(&articles);

        let words: Vec<&str> = ranked.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_top_keywords_and_recent_timeline_are_capped() {
        let keywords: Vec<String> = (0..20).map(|i| format!("k{:02}", i)).collect();
        let keyword_refs: Vec<&str> = keywords.iter().map(|k| k.as_str()).collect();
        let timeline = (1..=20)
            .map(|day| TimelinePoint {
                date: format!("2024-05-{:02}", day),
                average_sentiment: 0.1,
                article_count: 1,
            })
            .collect();

        let snapshot = DashboardSnapshot::new(
            vec![create_test_entry(1, &keyword_refs)],
            vec![],
            vec![],
            timeline,
        );

        assert_eq!(snapshot.top_keywords().len(), TOP_KEYWORDS);
        assert_eq!(snapshot.recent_timeline().len(), TIMELINE_POINTS);
        assert_eq!(snapshot.recent_timeline()[0].date, "2024-05-06");
    }

    #[test]
    fn test_category_choices() {
        let topics = Topics {
            default_topics: vec!["Politics".to_string()],
            custom_topics: vec!["Climate".to_string()],
        };

        assert_eq!(category_choices(Some(&topics)), vec!["Politics", "Climate"]);
        assert_eq!(category_choices(None).len(), DEFAULT_CATEGORIES.len());
        assert_eq!(category_choices(Some(&Topics::default())).len(), DEFAULT_CATEGORIES.len());
    }

    #[tokio::test]
    async fn test_load_dashboard() {
        let api = ApiClient::new(scripted_dashboard());

        let snapshot = load_dashboard(&api, "tok").await.unwrap();

        assert_eq!(snapshot.articles.len(), 3);
        assert_eq!(snapshot.keywords[0], ("economy".to_string(), 2));
        assert_eq!(snapshot.articles_in("Politics").len(), 2);
        assert_eq!(snapshot.sources[0].source, "Daily");
    }

    #[tokio::test]
    async fn test_any_failed_fetch_fails_the_refresh() {
        for failing in ["/dashboard", "/category_analysis", "/source_analysis", "/sentiment_timeline"] {
            let transport = scripted_dashboard();
            transport.respond(Method::GET, failing, response(500, r#"{"message": "boom"}"#));
            let api = ApiClient::new(transport);

            let state = DashboardState::from(load_dashboard(&api, "tok").await);

            assert_eq!(state, DashboardState::Failed("boom".to_string()), "failing {}", failing);
        }
    }

    #[tokio::test]
    async fn test_move_article_refetches_after_write() {
        let transport = scripted_dashboard();
        transport.respond(Method::POST, "/move_article", response(200, r#"{"message": "Moved"}"#));
        let api = ApiClient::new(transport.clone());

        move_article(&api, "tok", 3, "Science").await.unwrap();

        let paths: Vec<String> = transport.requests().iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths[0], "/move_article");
        assert_eq!(paths.len(), 5);
        assert_eq!(
            transport.requests()[0].body.clone().unwrap(),
            serde_json::json!({ "article_id": 3, "new_category": "Science" })
        );
    }

    #[tokio::test]
    async fn test_failed_move_does_not_refetch() {
        let transport = scripted_dashboard();
        transport.respond(Method::POST, "/move_article", response(404, r#"{"message": "Article not found"}"#));
        let api = ApiClient::new(transport.clone());

        let err = move_article(&api, "tok", 99, "Science").await.unwrap_err();

        assert_eq!(err.to_string(), "Article not found");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_create_topic_requires_name() {
        let transport = scripted_dashboard();
        let api = ApiClient::new(transport.clone());

        assert!(create_topic(&api, "tok", "  ").await.is_err());
        assert!(transport.requests().is_empty());
    }
}
