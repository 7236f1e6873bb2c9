//! Cross-builder tests for the qb module.

use crate::condition::ConditionSet;
use crate::qb::{Join, JoinOn, MutationQb, Precondition, SqlQb, delete, insert, select, select_as, update};
use crate::row_shape;
use crate::value::Value;

struct RiskRow {
    id: String,
    name: String,
}

row_shape!(RiskRow { id, name });

fn risk() -> RiskRow {
    RiskRow {
        id: "r1".into(),
        name: "Phishing Risk".into(),
    }
}

#[test]
fn test_select_basic() {
    assert_eq!(select("users").to_sql().unwrap(), r#"SELECT * FROM "users""#);
}

#[test]
fn test_select_as_qualifies_where() {
    let stmt = select_as("users", "u").eq("status", "active").build().unwrap();
    assert_eq!(
        stmt.sql(),
        r#"SELECT * FROM "users" AS "u" WHERE "u"."status" = $1"#
    );
    assert_eq!(stmt.param("where_status"), Some(&Value::Text("active".into())));
}

#[test]
fn test_identifiers_cannot_break_out_of_quotes() {
    let sql = select(r#"users"; DROP TABLE users; --"#).to_sql().unwrap();
    assert_eq!(sql, r#"SELECT * FROM "users""; DROP TABLE users; --""#);
}

#[test]
fn test_values_never_appear_in_sql_text() {
    let hostile = "'; DELETE FROM risks; --";
    let stmts = [
        select("risks").eq("name", hostile).build().unwrap(),
        insert("risks")
            .values(&RiskRow {
                id: "x".into(),
                name: hostile.into(),
            })
            .build()
            .unwrap(),
        update("risks")
            .values(&risk())
            .eq("name", hostile)
            .build()
            .unwrap(),
        delete("risks").eq("name", hostile).build().unwrap(),
    ];
    for stmt in &stmts {
        assert!(!stmt.sql().contains("DELETE FROM risks"));
        assert!(stmt.values().any(|v| v == &Value::from(hostile)));
    }
}

#[test]
fn test_predicate_count_matches_condition_count() {
    let conditions: ConditionSet = [("a", 1i64), ("b", 2), ("c", 3)].into_iter().collect();
    let stmt = delete("t").where_all(&conditions).build().unwrap();
    assert_eq!(stmt.sql().matches(" = $").count(), conditions.len());
    assert_eq!(stmt.param_count(), conditions.len());
}

#[test]
fn test_mutations_reject_empty_where() {
    assert!(update("risks").values(&risk()).build().unwrap_err().is_config());
    assert!(delete("risks").build().unwrap_err().is_config());
}

#[test]
fn test_existence_preconditions() {
    let check = ConditionSet::new().eq("id", "r1");
    let ins = insert("risks").values(&risk()).check_exists(check.clone());
    let upd = update("risks")
        .values(&risk())
        .eq("id", "r1")
        .check_exists(check.clone());
    let del = delete("risks").eq("id", "r1").check_exists(check);

    assert_eq!(ins.existence_check().map(|c| c.1), Some(Precondition::Absent));
    assert_eq!(upd.existence_check().map(|c| c.1), Some(Precondition::Present));
    assert_eq!(del.existence_check().map(|c| c.1), Some(Precondition::Present));
}

#[test]
fn test_join_projection_feeds_select_list() {
    let qb = select_as("risk_owners", "ro")
        .select_fields(&["id"])
        .join(
            Join::left("users", JoinOn::eq("usr.id", "ro.user_id"))
                .alias("usr")
                .fields(&["name", "email"]),
        )
        .select_joins();
    assert_eq!(
        qb.to_sql().unwrap(),
        r#"SELECT "ro"."id", "usr"."name" AS "usr_name", "usr"."email" AS "usr_email" FROM "risk_owners" AS "ro" LEFT JOIN "users" AS "usr" ON "usr"."id" = "ro"."user_id""#
    );
}
