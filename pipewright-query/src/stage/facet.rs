//! `$facet`.

use bson::{Bson, Document};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult, ensure_unique};
use crate::pipeline::Pipeline;
use crate::stage::Stage;

/// Run several sub-pipelines over the same input documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facet {
    facets: Vec<(String, Pipeline)>,
}

impl Facet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output field holding the results of `pipeline`.
    pub fn facet(mut self, name: impl Into<String>, pipeline: Pipeline) -> Self {
        self.facets.push((name.into(), pipeline));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Sub-pipelines share the outer context: they read the same collection.
    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        if self.facets.is_empty() {
            return Err(EncodeError::stage("$facet", "at least one facet is required"));
        }
        ensure_unique("$facet", self.facets.iter().map(|(k, _)| k.as_str()))?;

        let mut out = Document::new();
        for (name, pipeline) in &self.facets {
            if name.is_empty() || name.starts_with('$') || name.contains('.') {
                return Err(EncodeError::stage(
                    "$facet",
                    format!("'{}' is not a valid facet name", name),
                ));
            }
            if pipeline.is_empty() {
                return Err(EncodeError::stage(
                    "$facet",
                    format!("facet '{}' has an empty pipeline", name),
                ));
            }
            if let Some(stage) = pipeline.stages().iter().find(|s| {
                matches!(s, Stage::Facet(_) | Stage::Out(_) | Stage::Merge(_))
            }) {
                return Err(EncodeError::stage(
                    "$facet",
                    format!("{} is not allowed inside facet '{}'", stage.name(), name),
                ));
            }
            let stages: Vec<Bson> = pipeline
                .encode(ctx)?
                .into_iter()
                .map(Bson::Document)
                .collect();
            out.insert(name.as_str(), stages);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::expr::field;
    use crate::stage::{Bucket, BucketAuto};

    fn enc(facet: Facet) -> EncodeResult<Document> {
        Stage::from(facet).encode(&EncodeContext::new())
    }

    #[test]
    fn test_facet() {
        let facet = Facet::new()
            .facet(
                "categorizedByTags",
                Pipeline::new().unwind("tags").sort_by_count(field("tags")),
            )
            .facet(
                "categorizedByYears(Auto)",
                Pipeline::new().bucket_auto(BucketAuto::new(field("year"), 4)),
            );
        assert_eq!(
            enc(facet).unwrap(),
            doc! {
                "$facet": {
                    "categorizedByTags": [
                        { "$unwind": "$tags" },
                        { "$sortByCount": "$tags" }
                    ],
                    "categorizedByYears(Auto)": [
                        { "$bucketAuto": { "groupBy": "$year", "buckets": 4 } }
                    ]
                }
            }
        );
    }

    #[test]
    fn test_facet_validation() {
        assert!(enc(Facet::new()).unwrap_err().is_invalid_stage());
        assert!(
            enc(Facet::new().facet("a", Pipeline::new()))
                .unwrap_err()
                .is_invalid_stage()
        );
        assert!(
            enc(Facet::new().facet("a", Pipeline::new().out("archive")))
                .unwrap_err()
                .is_invalid_stage()
        );
        let nested = Facet::new().facet("inner", Pipeline::new().limit(1));
        assert!(
            enc(Facet::new().facet("outer", Pipeline::new().facet(nested)))
                .unwrap_err()
                .is_invalid_stage()
        );
        let bucket = Bucket::new(field("price"), [0, 100]);
        assert!(
            enc(Facet::new()
                .facet("a", Pipeline::new().bucket(bucket.clone()))
                .facet("a", Pipeline::new().bucket(bucket)))
            .unwrap_err()
            .is_duplicate_field()
        );
    }
}
