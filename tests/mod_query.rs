use bson::{Bson, doc};
use listings_cluster::DbError;
use listings_cluster::listings::{scan_filter, scan_projection, scan_sort};
use listings_cluster::query::{Order, compare_bson, compare_docs, eval_filter, parse_filter, parse_projection, parse_sort};
use std::cmp::Ordering;

#[test]
fn scan_filter_selects_by_price_and_nights() {
    let f = parse_filter(&scan_filter(100, 1)).unwrap();
    assert!(eval_filter(&doc! { "price": 100.0, "minimum_nights_avg_ntm": 1.0 }, &f));
    assert!(eval_filter(&doc! { "price": 20, "minimum_nights_avg_ntm": 1_i64 }, &f));
    assert!(!eval_filter(&doc! { "price": 100.5, "minimum_nights_avg_ntm": 1 }, &f));
    assert!(!eval_filter(&doc! { "price": 20, "minimum_nights_avg_ntm": 2 }, &f));
    assert!(!eval_filter(&doc! { "minimum_nights_avg_ntm": 1 }, &f));
    assert!(!eval_filter(&doc! { "price": "20", "minimum_nights_avg_ntm": 1 }, &f));
}

#[test]
fn logical_operators() {
    let f = parse_filter(&doc! {
        "$or": [ { "city": "Portland" }, { "zipcode": { "$in": [97201, 97202] } } ],
        "$nor": [ { "bedrooms": { "$lt": 1 } } ],
    })
    .unwrap();
    assert!(eval_filter(&doc! { "city": "Portland", "bedrooms": 2 }, &f));
    assert!(eval_filter(&doc! { "city": "Salem", "zipcode": 97202, "bedrooms": 1 }, &f));
    assert!(!eval_filter(&doc! { "city": "Salem", "zipcode": 97203, "bedrooms": 1 }, &f));
    assert!(!eval_filter(&doc! { "city": "Portland", "bedrooms": 0 }, &f));
}

#[test]
fn exists_not_and_nested_paths() {
    let f = parse_filter(&doc! {
        "host.name": { "$exists": true },
        "price": { "$not": { "$gt": 50 } },
    })
    .unwrap();
    assert!(eval_filter(&doc! { "host": { "name": "Ana" }, "price": 40 }, &f));
    assert!(!eval_filter(&doc! { "host": { "id": 1 }, "price": 40 }, &f));
    assert!(!eval_filter(&doc! { "host": { "name": "Ana" }, "price": 60 }, &f));
}

#[test]
fn null_filter_matches_absent_fields() {
    let f = parse_filter(&doc! { "accommodates": Bson::Null }).unwrap();
    assert!(eval_filter(&doc! { "id": 1 }, &f));
    assert!(eval_filter(&doc! { "id": 2, "accommodates": Bson::Null }, &f));
    assert!(!eval_filter(&doc! { "id": 3, "accommodates": 2 }, &f));

    let f = parse_filter(&doc! { "accommodates": { "$ne": Bson::Null } }).unwrap();
    assert!(!eval_filter(&doc! { "id": 1 }, &f));
    assert!(eval_filter(&doc! { "id": 3, "accommodates": 2 }, &f));
}

#[test]
fn unknown_operator_is_a_query_error() {
    assert!(matches!(parse_filter(&doc! { "price": { "$near": 1 } }), Err(DbError::QueryError(_))));
    assert!(matches!(parse_filter(&doc! { "$where": "1" }), Err(DbError::QueryError(_))));
}

#[test]
fn numeric_types_compare_by_value() {
    assert_eq!(compare_bson(&Bson::Int32(1), &Bson::Double(1.0)), Ordering::Equal);
    assert_eq!(compare_bson(&Bson::Int64(2), &Bson::Double(1.5)), Ordering::Greater);
}

#[test]
fn scan_sort_and_projection() {
    let sort = parse_sort(&scan_sort()).unwrap();
    assert_eq!(sort.len(), 1);
    assert_eq!(sort[0].order, Order::Asc);
    assert_eq!(
        compare_docs(&doc! { "price": 20 }, &doc! { "price": 50.0 }, &sort),
        Ordering::Less
    );

    let projection = parse_projection(&scan_projection()).unwrap();
    assert!(!projection.include_id);
    let out = projection.apply(&doc! {
        "_id": 1, "id": 7, "price": 20, "bedrooms": 3, "smart_location": "Portland, OR",
    });
    assert_eq!(out, doc! { "id": 7, "price": 20, "smart_location": "Portland, OR" });
}
