use std::time::Duration;

use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};

use learnia_core::catalog::CatalogStore;
use learnia_core::config::CatalogConfig;
use learnia_core::error::{Error, Result};
use learnia_core::model::course::{Category, Course};
use learnia_core::model::filters::SearchFilters;

/// Course catalog backed by a MongoDB Atlas collection with a vector search
/// index over the `embedding` field.
pub struct MongoCatalog {
    collection: Collection<Document>,
    search_index: String,
}

impl MongoCatalog {
    /// Connect using the configured URI and timeouts. The URI is required.
    pub async fn connect(config: &CatalogConfig) -> Result<Self> {
        if config.uri.is_empty() {
            return Err(Error::ServiceUnavailable(
                "catalog connection URI is required".to_string(),
            ));
        }

        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| Error::ServiceUnavailable(format!("invalid catalog URI: {e}")))?;
        options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));

        let client = Client::with_options(options)
            .map_err(|e| Error::ServiceUnavailable(format!("catalog client failed: {e}")))?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);

        Ok(Self {
            collection,
            search_index: config.search_index.clone(),
        })
    }
}

#[async_trait::async_trait]
impl CatalogStore for MongoCatalog {
    async fn search(
        &self,
        embedding: &[f32],
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<Course>> {
        let pipeline = search_pipeline(&self.search_index, embedding, limit);

        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| map_catalog("vector search failed", &e))?;

        let mut results = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| map_catalog("vector search cursor failed", &e))?
        {
            let course = course_from_doc(&doc, false);
            if filters.matches(&course) {
                results.push(course);
            }
            if results.len() == limit {
                break;
            }
        }
        Ok(results)
    }

    async fn course_by_id(&self, course_id: &str) -> Result<Option<Course>> {
        let document = self
            .collection
            .find_one(id_query(course_id))
            .await
            .map_err(|e| map_catalog("course fetch failed", &e))?;
        Ok(document.map(|doc| course_from_doc(&doc, true)))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let pipeline = vec![
            doc! {
                "$group": {
                    "_id": { "$ifNull": ["$category", "General"] },
                    "count": { "$sum": 1 },
                }
            },
            doc! { "$sort": { "count": -1 } },
        ];

        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| map_catalog("categories aggregation failed", &e))?;

        let mut categories = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| map_catalog("categories cursor failed", &e))?
        {
            categories.push(Category {
                name: doc.get_str("_id").unwrap_or("General").to_string(),
                count: integer_field(&doc, "count").unwrap_or(0),
            });
        }
        Ok(categories)
    }

    async fn trending(&self, limit: i64) -> Result<Vec<Course>> {
        let mut cursor = self
            .collection
            .find(doc! {})
            .projection(course_projection())
            .sort(doc! { "students_count": -1, "rating": -1 })
            .limit(limit.max(0))
            .await
            .map_err(|e| map_catalog("trending query failed", &e))?;

        let mut courses = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| map_catalog("trending cursor failed", &e))?
        {
            courses.push(course_from_doc(&doc, false));
        }
        Ok(courses)
    }
}

fn map_catalog(context: &str, e: &mongodb::error::Error) -> Error {
    tracing::error!(error = %e, "{context}");
    Error::Catalog(format!("{context}: {e}"))
}

/// `$vectorSearch` over a `limit × 20` candidate window, projecting the
/// fixed course field set plus the similarity score.
fn search_pipeline(index: &str, embedding: &[f32], limit: usize) -> Vec<Document> {
    let query_vector: Vec<f64> = embedding.iter().map(|v| f64::from(*v)).collect();
    let mut projection = course_projection();
    projection.insert("score", doc! { "$meta": "vectorSearchScore" });

    vec![
        doc! {
            "$vectorSearch": {
                "index": index,
                "path": "embedding",
                "queryVector": query_vector,
                "numCandidates": (limit * 20) as i64,
                "limit": limit as i64,
            }
        },
        doc! { "$project": projection },
    ]
}

fn course_projection() -> Document {
    doc! {
        "_id": 1,
        "title": 1,
        "description": 1,
        "url": 1,
        "platform": 1,
        "rating": 1,
        "duration": 1,
        "price": 1,
        "language": 1,
        "category": 1,
        "level": 1,
        "students_count": 1,
    }
}

/// Native-id lookup when the id parses as an ObjectId, legacy alias
/// otherwise.
fn id_query(course_id: &str) -> Document {
    match ObjectId::parse_str(course_id) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "legacy_id": course_id },
    }
}

fn course_from_doc(doc: &Document, include_metadata: bool) -> Course {
    Course {
        course_id: id_string(doc),
        title: doc.get_str("title").unwrap_or_default().to_string(),
        description: doc.get_str("description").unwrap_or_default().to_string(),
        url: doc.get_str("url").unwrap_or_default().to_string(),
        platform: doc.get_str("platform").unwrap_or_default().to_string(),
        rating: numeric_field(doc, "rating"),
        duration: string_field(doc, "duration"),
        price: numeric_field(doc, "price"),
        language: string_field(doc, "language"),
        category: string_field(doc, "category"),
        level: string_field(doc, "level"),
        students_count: integer_field(doc, "students_count"),
        score: numeric_field(doc, "score"),
        embedding_model: include_metadata
            .then(|| string_field(doc, "embedding_model"))
            .flatten(),
        embedding_dim: include_metadata
            .then(|| integer_field(doc, "embedding_dim"))
            .flatten(),
        processed_at: include_metadata
            .then(|| string_field(doc, "processed_at"))
            .flatten(),
    }
}

fn id_string(doc: &Document) -> String {
    match doc.get("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// String-ish fields: documents ingested from heterogeneous sources store
/// the occasional number where a string is expected.
fn string_field(doc: &Document, key: &str) -> Option<String> {
    match doc.get(key) {
        Some(Bson::String(s)) => Some(s.clone()),
        Some(Bson::Int32(v)) => Some(v.to_string()),
        Some(Bson::Int64(v)) => Some(v.to_string()),
        Some(Bson::Double(v)) => Some(v.to_string()),
        Some(Bson::DateTime(dt)) => dt.try_to_rfc3339_string().ok(),
        _ => None,
    }
}

fn numeric_field(doc: &Document, key: &str) -> Option<f64> {
    match doc.get(key) {
        Some(Bson::Double(v)) => Some(*v),
        Some(Bson::Int32(v)) => Some(f64::from(*v)),
        Some(Bson::Int64(v)) => Some(*v as f64),
        _ => None,
    }
}

fn integer_field(doc: &Document, key: &str) -> Option<i64> {
    match doc.get(key) {
        Some(Bson::Int32(v)) => Some(i64::from(*v)),
        Some(Bson::Int64(v)) => Some(*v),
        Some(Bson::Double(v)) => Some(*v as i64),
        _ => None,
    }
}
