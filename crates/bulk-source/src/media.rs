use serde_json::Value;
use tracing::debug;

use crate::global_id::GlobalId;
use crate::record::{FileId, ResultRecord};

/// Field carrying the remote URL of an image-shaped object.
const IMAGE_URL_FIELD: &str = "originalSrc";
/// Field the materialized file id is written to, next to the URL.
const LOCAL_FILE_FIELD: &str = "localFile";

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MaterializeError(pub String);

/// Turns a remote file URL into a local file the host knows about.
#[async_trait::async_trait]
pub trait MediaMaterializer: Send + Sync {
    async fn materialize(&self, url: &str) -> Result<FileId, MaterializeError>;
}

/// A media fetch that failed for one record. The record is still emitted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("could not download {url} for {record}: {reason}")]
pub struct MediaError {
    pub record: GlobalId,
    pub url: String,
    pub reason: String,
}

/// Replaces remote image URLs in a record with local file references.
pub struct MediaResolver<'a> {
    materializer: Option<&'a dyn MediaMaterializer>,
}

impl<'a> MediaResolver<'a> {
    /// Inactive unless `enabled` and a materializer is present.
    pub fn new(materializer: Option<&'a dyn MediaMaterializer>, enabled: bool) -> Self {
        Self {
            materializer: materializer.filter(|_| enabled),
        }
    }

    pub fn is_active(&self) -> bool {
        self.materializer.is_some()
    }

    /// Set `localFile` on every image object in `record`, sequentially.
    /// Failures leave the image untouched and are returned alongside.
    pub async fn resolve(&self, mut record: ResultRecord) -> (ResultRecord, Vec<MediaError>) {
        let Some(materializer) = self.materializer else {
            return (record, Vec::new());
        };

        let mut root = Value::Object(std::mem::take(&mut record.fields));
        let mut pointers = Vec::new();
        collect_image_pointers(&root, &mut String::new(), &mut pointers);

        let mut errors = Vec::new();
        for pointer in pointers {
            let Some(url) = root
                .pointer(&pointer)
                .and_then(|image| image.get(IMAGE_URL_FIELD))
                .and_then(Value::as_str)
                .map(str::to_owned)
            else {
                continue;
            };

            match materializer.materialize(&url).await {
                Ok(file_id) => {
                    debug!(record = %record.id, %url, file_id = file_id.as_str(), "materialized image");
                    if let Some(Value::Object(image)) = root.pointer_mut(&pointer) {
                        image.insert(
                            LOCAL_FILE_FIELD.to_owned(),
                            Value::String(file_id.as_str().to_owned()),
                        );
                    }
                }
                Err(err) => errors.push(MediaError {
                    record: record.id.clone(),
                    url,
                    reason: err.to_string(),
                }),
            }
        }

        if let Value::Object(fields) = root {
            record.fields = fields;
        }
        (record, errors)
    }
}

/// Collect JSON pointers to every object that has a string `originalSrc`.
fn collect_image_pointers(value: &Value, pointer: &mut String, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.get(IMAGE_URL_FIELD).is_some_and(Value::is_string) && !pointer.is_empty() {
                out.push(pointer.clone());
            }
            for (key, child) in map {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                collect_image_pointers(child, pointer, out);
                pointer.truncate(len);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&index.to_string());
                collect_image_pointers(child, pointer, out);
                pointer.truncate(len);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_support::FakeMaterializer;

    use super::*;

    fn record(value: Value) -> ResultRecord {
        let Value::Object(fields) = value else {
            panic!("expected object");
        };
        ResultRecord {
            id: GlobalId::new("gid://shopify/Product/12345"),
            parent_id: None,
            fields,
        }
    }

    #[tokio::test]
    async fn links_local_file_next_to_original_url() {
        let materializer = FakeMaterializer::returning("12345");
        let resolver = MediaResolver::new(Some(&materializer), true);

        let (resolved, errors) = resolver
            .resolve(record(json!({
                "featuredMedia": {
                    "preview": {
                        "image": { "originalSrc": "http://www.example.com/some-image.jpg" }
                    }
                }
            })))
            .await;

        assert!(errors.is_empty());
        let image = &resolved.fields["featuredMedia"]["preview"]["image"];
        assert_eq!(image["localFile"], "12345");
        assert_eq!(image["originalSrc"], "http://www.example.com/some-image.jpg");
        assert_eq!(
            materializer.requested(),
            vec!["http://www.example.com/some-image.jpg".to_owned()]
        );
    }

    #[tokio::test]
    async fn resolves_images_inside_arrays() {
        let materializer = FakeMaterializer::returning("file");
        let resolver = MediaResolver::new(Some(&materializer), true);

        let (resolved, _) = resolver
            .resolve(record(json!({
                "images": [
                    { "originalSrc": "http://a.jpg" },
                    { "altText": "no url" },
                    { "originalSrc": "http://b.jpg" }
                ]
            })))
            .await;

        assert_eq!(resolved.fields["images"][0]["localFile"], "file");
        assert!(resolved.fields["images"][1].get("localFile").is_none());
        assert_eq!(resolved.fields["images"][2]["localFile"], "file");
        assert_eq!(materializer.requested().len(), 2);
    }

    #[tokio::test]
    async fn disabled_resolver_passes_records_through() {
        let materializer = FakeMaterializer::returning("12345");
        let resolver = MediaResolver::new(Some(&materializer), false);
        assert!(!resolver.is_active());

        let input = record(json!({"image": {"originalSrc": "http://a.jpg"}}));
        let (resolved, errors) = resolver.resolve(input.clone()).await;

        assert_eq!(resolved, input);
        assert!(errors.is_empty());
        assert!(materializer.requested().is_empty());
    }

    #[tokio::test]
    async fn failed_download_keeps_record_without_local_file() {
        let materializer = FakeMaterializer::returning("ok");
        materializer.fail_for("http://broken.jpg", "404 Not Found");
        let resolver = MediaResolver::new(Some(&materializer), true);

        let (resolved, errors) = resolver
            .resolve(record(json!({
                "featuredImage": { "originalSrc": "http://broken.jpg" },
                "secondImage": { "originalSrc": "http://fine.jpg" }
            })))
            .await;

        assert!(resolved.fields["featuredImage"].get("localFile").is_none());
        assert_eq!(resolved.fields["secondImage"]["localFile"], "ok");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].url, "http://broken.jpg");
        assert!(errors[0].to_string().contains("404 Not Found"));
    }

    #[test]
    fn pointers_escape_special_characters() {
        let value = json!({"a/b": {"c~d": {"originalSrc": "http://x"}}});
        let mut out = Vec::new();
        collect_image_pointers(&value, &mut String::new(), &mut out);
        assert_eq!(out, vec!["/a~1b/c~0d".to_owned()]);
        assert!(value.pointer(&out[0]).is_some());
    }
}
