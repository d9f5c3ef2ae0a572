use crate::errors::DbError;
use bson::{Bson, Document as BsonDocument};

use super::types::{
    CmpOp, Filter, MAX_IN_SET, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS, Order, Projection, SortSpec,
};

/// Parses a Mongo-style filter document, e.g.
/// `{ "price": { "$lte": 100 }, "city": "Portland" }`.
///
/// # Errors
/// Returns `QueryError` for unknown operators or malformed operands.
pub fn parse_filter(doc: &BsonDocument) -> Result<Filter, DbError> {
    let mut clauses = Vec::with_capacity(doc.len());
    for (key, value) in doc {
        clauses.push(parse_clause(key, value)?);
    }
    Ok(match clauses.len() {
        0 => Filter::True,
        1 => clauses.remove(0),
        _ => Filter::And(clauses),
    })
}

fn parse_clause(key: &str, value: &Bson) -> Result<Filter, DbError> {
    match key {
        "$and" => Ok(Filter::And(parse_filter_list(key, value)?)),
        "$or" => Ok(Filter::Or(parse_filter_list(key, value)?)),
        "$nor" => Ok(Filter::Not(Box::new(Filter::Or(parse_filter_list(key, value)?)))),
        k if k.starts_with('$') => {
            Err(DbError::QueryError(format!("unsupported top-level operator {k}")))
        }
        path => parse_field(path, value),
    }
}

fn parse_filter_list(op: &str, value: &Bson) -> Result<Vec<Filter>, DbError> {
    let Bson::Array(items) = value else {
        return Err(DbError::QueryError(format!("{op} requires an array")));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => parse_filter(d),
            _ => Err(DbError::QueryError(format!("{op} entries must be documents"))),
        })
        .collect()
}

fn parse_field(path: &str, value: &Bson) -> Result<Filter, DbError> {
    let ops = match value {
        Bson::Document(d) if d.keys().next().is_some_and(|k| k.starts_with('$')) => d,
        // A plain value (or a literal sub-document) is an equality match.
        other => return Ok(cmp(path, CmpOp::Eq, other.clone())),
    };
    let mut clauses = Vec::with_capacity(ops.len());
    for (op, operand) in ops {
        let clause = match op.as_str() {
            "$eq" => cmp(path, CmpOp::Eq, operand.clone()),
            "$ne" => cmp(path, CmpOp::Ne, operand.clone()),
            "$gt" => cmp(path, CmpOp::Gt, operand.clone()),
            "$gte" => cmp(path, CmpOp::Gte, operand.clone()),
            "$lt" => cmp(path, CmpOp::Lt, operand.clone()),
            "$lte" => cmp(path, CmpOp::Lte, operand.clone()),
            "$in" => Filter::In { path: path.to_string(), values: value_set(op, operand)? },
            "$nin" => Filter::Nin { path: path.to_string(), values: value_set(op, operand)? },
            "$exists" => Filter::Exists { path: path.to_string(), exists: truthy(operand) },
            "$not" => match operand {
                Bson::Document(_) => Filter::Not(Box::new(parse_field(path, operand)?)),
                _ => return Err(DbError::QueryError("$not requires a document".into())),
            },
            other => {
                return Err(DbError::QueryError(format!("unsupported operator {other} on {path}")));
            }
        };
        clauses.push(clause);
    }
    Ok(if clauses.len() == 1 { clauses.remove(0) } else { Filter::And(clauses) })
}

fn cmp(path: &str, op: CmpOp, value: Bson) -> Filter {
    Filter::Cmp { path: path.to_string(), op, value }
}

fn value_set(op: &str, operand: &Bson) -> Result<Vec<Bson>, DbError> {
    match operand {
        Bson::Array(vals) if vals.len() > MAX_IN_SET => Err(DbError::QueryError(format!(
            "{op} takes at most {MAX_IN_SET} values, got {}",
            vals.len()
        ))),
        Bson::Array(vals) => Ok(vals.clone()),
        _ => Err(DbError::QueryError(format!("{op} requires an array"))),
    }
}

fn truthy(v: &Bson) -> bool {
    match v {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(f) => *f != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

/// Parses a sort document such as `{ "price": 1, "id": -1 }`.
///
/// # Errors
/// Returns `QueryError` when a direction is neither `1` nor `-1`, or when
/// there are more than [`MAX_SORT_FIELDS`] keys.
pub fn parse_sort(doc: &BsonDocument) -> Result<Vec<SortSpec>, DbError> {
    if doc.len() > MAX_SORT_FIELDS {
        return Err(DbError::QueryError(format!(
            "sort takes at most {MAX_SORT_FIELDS} fields, got {}",
            doc.len()
        )));
    }
    doc.iter()
        .map(|(field, dir)| {
            let order = match dir {
                Bson::Int32(1) | Bson::Int64(1) => Order::Asc,
                Bson::Int32(-1) | Bson::Int64(-1) => Order::Desc,
                Bson::Double(d) if *d == 1.0 => Order::Asc,
                Bson::Double(d) if *d == -1.0 => Order::Desc,
                other => {
                    return Err(DbError::QueryError(format!(
                        "invalid sort direction {other} for {field}"
                    )));
                }
            };
            Ok(SortSpec { field: field.clone(), order })
        })
        .collect()
}

/// Parses an inclusion projection such as `{ "_id": 0, "id": 1, "price": 1 }`.
///
/// Only `_id` may be excluded; mixing exclusions of other fields into an
/// inclusion projection is rejected the same way the server rejects it.
///
/// # Errors
/// Returns `QueryError` for exclusion of any field other than `_id`, or
/// for more than [`MAX_PROJECTION_FIELDS`] keys.
pub fn parse_projection(doc: &BsonDocument) -> Result<Projection, DbError> {
    if doc.len() > MAX_PROJECTION_FIELDS {
        return Err(DbError::QueryError(format!(
            "projection takes at most {MAX_PROJECTION_FIELDS} fields, got {}",
            doc.len()
        )));
    }
    let mut proj = Projection::default();
    for (field, flag) in doc {
        let include = truthy(flag);
        if field == "_id" {
            proj.include_id = include;
        } else if include {
            proj.fields.push(field.clone());
        } else {
            return Err(DbError::QueryError(format!(
                "cannot exclude {field} in an inclusion projection"
            )));
        }
    }
    Ok(proj)
}
