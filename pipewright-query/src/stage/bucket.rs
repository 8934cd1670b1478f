//! `$bucket` and `$bucketAuto`.

use std::cmp::Ordering;

use bson::{Bson, Document};

use super::group::output_names;
use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult};
use crate::expr::Expression;

/// Group documents into buckets with explicit boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    group_by: Expression,
    boundaries: Vec<Bson>,
    default: Option<Bson>,
    output: Vec<(String, Expression)>,
}

impl Bucket {
    /// Bucket by `group_by`; each bucket spans `[boundaries[i], boundaries[i + 1])`.
    pub fn new<I, V>(group_by: impl Into<Expression>, boundaries: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Self {
            group_by: group_by.into(),
            boundaries: boundaries.into_iter().map(Into::into).collect(),
            default: None,
            output: Vec::new(),
        }
    }

    /// `_id` of the bucket collecting values outside the boundaries.
    pub fn default(mut self, default: impl Into<Bson>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Add an output field computed by an accumulator.
    pub fn output(mut self, name: impl Into<String>, accumulator: impl Into<Expression>) -> Self {
        self.output.push((name.into(), accumulator.into()));
        self
    }

    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        if self.boundaries.len() < 2 {
            return Err(EncodeError::stage("$bucket", "at least two boundaries are required"));
        }
        for pair in self.boundaries.windows(2) {
            match compare(&pair[0], &pair[1]) {
                Some(Ordering::Less) => {}
                Some(_) => {
                    return Err(EncodeError::stage(
                        "$bucket",
                        "boundaries must be in ascending order",
                    ));
                }
                None => {
                    return Err(EncodeError::stage(
                        "$bucket",
                        "boundaries must all be of the same type",
                    ));
                }
            }
        }
        let names = output_names("$bucket", &self.output, ctx)?;

        let mut out = Document::new();
        out.insert("groupBy", self.group_by.encode(ctx)?);
        out.insert("boundaries", Bson::Array(self.boundaries.clone()));
        if let Some(default) = &self.default {
            out.insert("default", default.clone());
        }
        if !self.output.is_empty() {
            out.insert("output", encode_output(names, &self.output, ctx)?);
        }
        Ok(out)
    }
}

/// Preferred number series for `$bucketAuto` boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    R5,
    R10,
    R20,
    R40,
    R80,
    OneTwoFive,
    E6,
    E12,
    E24,
    E48,
    E96,
    E192,
    PowersOf2,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::R5 => "R5",
            Self::R10 => "R10",
            Self::R20 => "R20",
            Self::R40 => "R40",
            Self::R80 => "R80",
            Self::OneTwoFive => "1-2-5",
            Self::E6 => "E6",
            Self::E12 => "E12",
            Self::E24 => "E24",
            Self::E48 => "E48",
            Self::E96 => "E96",
            Self::E192 => "E192",
            Self::PowersOf2 => "POWERSOF2",
        }
    }
}

/// Group documents into a fixed number of evenly filled buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketAuto {
    group_by: Expression,
    buckets: i64,
    output: Vec<(String, Expression)>,
    granularity: Option<Granularity>,
}

impl BucketAuto {
    pub fn new(group_by: impl Into<Expression>, buckets: i64) -> Self {
        Self {
            group_by: group_by.into(),
            buckets,
            output: Vec::new(),
            granularity: None,
        }
    }

    pub fn output(mut self, name: impl Into<String>, accumulator: impl Into<Expression>) -> Self {
        self.output.push((name.into(), accumulator.into()));
        self
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        if self.buckets <= 0 {
            return Err(EncodeError::stage("$bucketAuto", "buckets must be positive"));
        }
        let names = output_names("$bucketAuto", &self.output, ctx)?;

        let mut out = Document::new();
        out.insert("groupBy", self.group_by.encode(ctx)?);
        out.insert("buckets", super::int(self.buckets));
        if !self.output.is_empty() {
            out.insert("output", encode_output(names, &self.output, ctx)?);
        }
        if let Some(granularity) = self.granularity {
            out.insert("granularity", granularity.as_str());
        }
        Ok(out)
    }
}

fn encode_output(
    names: Vec<String>,
    output: &[(String, Expression)],
    ctx: &EncodeContext,
) -> EncodeResult<Document> {
    let mut out = Document::new();
    for (name, (_, accumulator)) in names.into_iter().zip(output) {
        out.insert(name, accumulator.encode(ctx)?);
    }
    Ok(out)
}

/// Order two boundary values of the same kind; numbers of any width compare
/// with each other.
fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    fn number(v: &Bson) -> Option<f64> {
        match v {
            Bson::Int32(n) => Some(f64::from(*n)),
            Bson::Int64(n) => Some(*n as f64),
            Bson::Double(n) => Some(*n),
            _ => None,
        }
    }

    match (a, b) {
        (Bson::Int64(x), Bson::Int64(y)) => Some(x.cmp(y)),
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        _ => number(a)?.partial_cmp(&number(b)?),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::{EntitySchema, FieldSchema};
    use crate::expr::accumulator::{push, sum};
    use crate::expr::field;
    use crate::stage::Stage;

    fn enc(stage: impl Into<Stage>) -> EncodeResult<Document> {
        stage.into().encode(&EncodeContext::new())
    }

    #[test]
    fn test_bucket() {
        let bucket = Bucket::new(field("year_born"), [1840, 1850, 1860, 1870, 1880])
            .default("Other")
            .output("count", sum(1))
            .output("artists", push(field("last_name")));
        assert_eq!(
            enc(bucket).unwrap(),
            doc! {
                "$bucket": {
                    "groupBy": "$year_born",
                    "boundaries": [1840, 1850, 1860, 1870, 1880],
                    "default": "Other",
                    "output": {
                        "count": { "$sum": 1 },
                        "artists": { "$push": "$last_name" }
                    }
                }
            }
        );
    }

    #[test]
    fn test_bucket_boundaries_validated() {
        assert!(enc(Bucket::new(field("x"), [1])).unwrap_err().is_invalid_stage());
        assert!(enc(Bucket::new(field("x"), [5, 1])).unwrap_err().is_invalid_stage());
        assert!(enc(Bucket::new(field("x"), [1, 1])).unwrap_err().is_invalid_stage());
        assert!(
            enc(Bucket::new(field("x"), [Bson::Int32(1), Bson::String("b".into())]))
                .unwrap_err()
                .is_invalid_stage()
        );
        assert!(
            enc(Bucket::new(field("x"), [Bson::Int32(0), Bson::Double(0.5), Bson::Int64(1)]))
                .is_ok()
        );
    }

    #[test]
    fn test_bucket_auto() {
        let bucket = BucketAuto::new(field("price"), 4)
            .output("count", sum(1))
            .granularity(Granularity::OneTwoFive);
        assert_eq!(
            enc(bucket).unwrap(),
            doc! {
                "$bucketAuto": {
                    "groupBy": "$price",
                    "buckets": 4,
                    "output": { "count": { "$sum": 1 } },
                    "granularity": "1-2-5"
                }
            }
        );
        assert!(enc(BucketAuto::new(field("price"), 0)).unwrap_err().is_invalid_stage());
    }

    #[test]
    fn test_output_names_are_mapped() {
        let ctx = EncodeContext::for_schema(Arc::new(EntitySchema::new(
            "Artist",
            "artists",
            vec![
                FieldSchema::new("lastName").stored_as("last_name"),
                FieldSchema::new("total").stored_as("n"),
            ],
        )));
        let bucket = Bucket::new(field("born"), [1840, 1850])
            .output("total", sum(1))
            .output("lastName", push(field("lastName")));
        assert_eq!(
            Stage::from(bucket).encode(&ctx).unwrap(),
            doc! {
                "$bucket": {
                    "groupBy": "$born",
                    "boundaries": [1840, 1850],
                    "output": { "n": { "$sum": 1 }, "last_name": { "$push": "$last_name" } }
                }
            }
        );

        let bucket = BucketAuto::new(field("price"), 2)
            .output("total", sum(1))
            .output("n", sum(1));
        assert!(Stage::from(bucket).encode(&ctx).unwrap_err().is_duplicate_field());
    }
}
