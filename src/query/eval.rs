use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::types::{CmpOp, Filter, MAX_PATH_DEPTH, Order, Projection, SortSpec};

// A missing field compares equal to null, as on the server.
static MISSING: Bson = Bson::Null;

#[must_use]
pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Not(f) => !eval_filter(doc, f),
        Filter::Exists { path, exists } => get_path(doc, path).is_some() == *exists,
        Filter::In { path, values } => is_in_set(lookup(doc, path), values),
        Filter::Nin { path, values } => !is_in_set(lookup(doc, path), values),
        Filter::Cmp { path, op: CmpOp::Eq, value } => values_equal(lookup(doc, path), value),
        Filter::Cmp { path, op: CmpOp::Ne, value } => !values_equal(lookup(doc, path), value),
        Filter::Cmp { path, op, value } => {
            let Some(v) = get_path(doc, path) else {
                return false;
            };
            // Range operators only match values of the same type class.
            if type_class(v) != type_class(value) {
                return false;
            }
            let c = compare_bson(v, value);
            match op {
                CmpOp::Gt => c == Ordering::Greater,
                CmpOp::Gte => c != Ordering::Less,
                CmpOp::Lt => c == Ordering::Less,
                CmpOp::Lte => c != Ordering::Greater,
                CmpOp::Eq | CmpOp::Ne => unreachable!("handled above"),
            }
        }
    }
}

#[must_use]
pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortSpec]) -> Ordering {
    for s in sort {
        let va = get_path(a, &s.field);
        let vb = get_path(b, &s.field);
        let ord = match (va, vb) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if matches!(s.order, Order::Asc) { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return as_f64_num(a) == as_f64_num(b);
    }
    a == b
}

fn is_in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().any(|x| values_equal(v, x))
}

fn lookup<'a>(doc: &'a BsonDocument, path: &str) -> &'a Bson {
    get_path(doc, path).unwrap_or(&MISSING)
}

fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut parts = path.split('.').peekable();
    let mut segs = 0usize;
    while let Some(part) = parts.next() {
        segs += 1;
        if segs > MAX_PATH_DEPTH {
            return None;
        }
        let v = cur.get(part)?;
        if parts.peek().is_none() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

#[allow(clippy::cast_precision_loss)]
fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        Bson::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if is_num(a) && is_num(b) {
        return as_f64_num(a).total_cmp(&as_f64_num(b));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        _ => type_class(a).cmp(&type_class(b)),
    }
}

/// Cross-type sort rank; all numeric types share one class.
fn type_class(v: &Bson) -> u8 {
    match v {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::DbPointer(_) => 12,
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => 13,
        Bson::MaxKey => 255,
    }
}

impl Projection {
    #[must_use]
    pub fn apply(&self, doc: &BsonDocument) -> BsonDocument {
        let mut out = BsonDocument::new();
        if self.include_id
            && let Some(id) = doc.get("_id")
        {
            out.insert("_id", id.clone());
        }
        for f in &self.fields {
            if let Some(v) = doc.get(f) {
                out.insert(f.clone(), v.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn cmp(path: &str, op: CmpOp, value: impl Into<Bson>) -> Filter {
        Filter::Cmp { path: path.into(), op, value: value.into() }
    }

    #[test]
    fn numeric_equality_ignores_representation() {
        let d = doc! { "minimum_nights_avg_ntm": 1.0, "price": 50_i64 };
        assert!(eval_filter(&d, &cmp("minimum_nights_avg_ntm", CmpOp::Eq, 1)));
        assert!(eval_filter(&d, &cmp("price", CmpOp::Lte, 50)));
        assert!(!eval_filter(&d, &cmp("price", CmpOp::Lt, 50)));
    }

    #[test]
    fn range_does_not_cross_types() {
        let d = doc! { "zipcode": "97201" };
        assert!(!eval_filter(&d, &cmp("zipcode", CmpOp::Gte, 97201)));
        assert!(!eval_filter(&d, &cmp("zipcode", CmpOp::Lte, 97210)));
    }

    #[test]
    fn missing_field_only_matches_ne() {
        let d = doc! { "city": "Portland" };
        assert!(!eval_filter(&d, &cmp("bedrooms", CmpOp::Gt, 2)));
        assert!(eval_filter(&d, &cmp("bedrooms", CmpOp::Ne, 2)));
    }

    #[test]
    fn null_equality_matches_missing_and_explicit_null() {
        let missing = doc! { "city": "Portland" };
        let null = doc! { "accommodates": Bson::Null };
        let set = doc! { "accommodates": 4 };
        let is_null = cmp("accommodates", CmpOp::Eq, Bson::Null);
        assert!(eval_filter(&missing, &is_null));
        assert!(eval_filter(&null, &is_null));
        assert!(!eval_filter(&set, &is_null));

        let not_null = cmp("accommodates", CmpOp::Ne, Bson::Null);
        assert!(!eval_filter(&missing, &not_null));
        assert!(eval_filter(&set, &not_null));
    }

    #[test]
    fn in_set_with_null_matches_missing() {
        let d = doc! { "city": "Portland" };
        let f = Filter::In { path: "bedrooms".into(), values: vec![Bson::Null, Bson::Int32(3)] };
        assert!(eval_filter(&d, &f));
        let f = Filter::Nin { path: "bedrooms".into(), values: vec![Bson::Null] };
        assert!(!eval_filter(&d, &f));
    }

    #[test]
    fn dotted_path_reaches_subdocument() {
        let d = doc! { "host": { "listings": 3 } };
        assert!(eval_filter(&d, &cmp("host.listings", CmpOp::Eq, 3)));
        assert!(!eval_filter(&d, &cmp("host.listings.x", CmpOp::Eq, 3)));
    }

    #[test]
    fn sort_places_missing_first_ascending() {
        let a = doc! { "price": 20 };
        let b = doc! {};
        let spec = [SortSpec { field: "price".into(), order: Order::Asc }];
        assert_eq!(compare_docs(&a, &b, &spec), Ordering::Greater);
    }

    #[test]
    fn projection_keeps_selected_fields() {
        let d = doc! { "_id": 7, "id": 1, "price": 20, "city": "Portland" };
        let p = Projection { fields: vec!["id".into(), "price".into()], include_id: false };
        assert_eq!(p.apply(&d), doc! { "id": 1, "price": 20 });
        let p = Projection { fields: vec!["city".into()], include_id: true };
        assert_eq!(p.apply(&d), doc! { "_id": 7, "city": "Portland" });
    }
}
