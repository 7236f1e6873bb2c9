//! Risk register flow: create a register, add risks, rate and close them.
//!
//! Run with:
//!   cargo run --example risk_register -p pgshape
//!
//! Requires DB_USER, DB_PASSWORD, DB_HOST, DB_PORT and DB_NAME (a `.env` file works).

use chrono::{DateTime, Utc};
use pgshape::prelude::*;
use pgshape::{Action, BuiltStatement};
use serde::Deserialize;
use uuid::Uuid;

struct CreateRiskRegister {
    risk_register_id: String,
    module_id: String,
    name: String,
    year: i32,
    status: String,
    creator: String,
    created_at: DateTime<Utc>,
}

row_shape!(CreateRiskRegister {
    risk_register_id,
    module_id,
    name,
    year,
    status,
    creator,
    created_at
});

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ReadRiskRegister {
    risk_register_id: String,
    module_id: String,
    name: String,
    year: i32,
    status: String,
    creator: String,
    created_at: DateTime<Utc>,
}

struct CreateRisk {
    risk_id: String,
    risk_register_id: String,
    name: String,
    category: String,
}

row_shape!(CreateRisk {
    risk_id,
    risk_register_id,
    name,
    category
});

struct CreateRiskRating {
    risk_id: String,
    likelihood: i32,
    impact: i32,
    rated_by: String,
}

row_shape!(CreateRiskRating {
    risk_id,
    likelihood,
    impact,
    rated_by
});

struct RatingJoin {
    likelihood: i32,
    impact: i32,
}

row_shape!(RatingJoin { likelihood, impact });

#[derive(Debug, Deserialize)]
struct RatedRisk {
    risk_id: String,
    name: String,
    rt_likelihood: Option<i32>,
    rt_impact: Option<i32>,
}

struct CloseRiskRegister {
    status: String,
}

row_shape!(CloseRiskRegister { status });

#[tokio::main]
async fn main() -> DbResult<()> {
    let pool = DbConfig::from_env()?.create_pool()?;
    let mut client = acquire(&pool).await?;

    // ── Setup ────────────────────────────────────────────────────────────────
    for ddl in [
        "DROP TABLE IF EXISTS risk_ratings, risks, risk_registers CASCADE",
        "CREATE TABLE risk_registers (
            risk_register_id TEXT PRIMARY KEY,
            module_id TEXT NOT NULL,
            name TEXT NOT NULL UNIQUE,
            year INT NOT NULL,
            status TEXT NOT NULL,
            creator TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )",
        "CREATE TABLE risks (
            risk_id TEXT PRIMARY KEY,
            risk_register_id TEXT NOT NULL REFERENCES risk_registers,
            name TEXT NOT NULL,
            category TEXT NOT NULL
        )",
        "CREATE TABLE risk_ratings (
            risk_id TEXT PRIMARY KEY REFERENCES risks,
            likelihood INT NOT NULL,
            impact INT NOT NULL,
            rated_by TEXT NOT NULL
        )",
    ] {
        let stmt = BuiltStatement::raw(ddl, Vec::<Value>::new());
        pgshape::exec::execute(&client, Action::Raw, "risk_registers", &stmt).await?;
    }

    // ── Create a register (refusing a second one with the same name) ────────
    let register = CreateRiskRegister {
        risk_register_id: Uuid::new_v4().to_string(),
        module_id: "finance".into(),
        name: "FY2026 Operational Risks".into(),
        year: 2026,
        status: "current".into(),
        creator: "u-1".into(),
        created_at: Utc::now(),
    };
    let created = qb::insert("risk_registers")
        .values(&register)
        .check_exists(ConditionSet::new().eq("name", &register.name))
        .returning(&["risk_register_id", "name"])
        .execute(&client)
        .await?;
    println!("[1] Created register: {created:?}");

    let again = qb::insert("risk_registers")
        .values(&register)
        .check_exists(ConditionSet::new().eq("name", &register.name))
        .execute(&client)
        .await;
    match again {
        Err(DbError::Duplicate { .. }) => println!("[2] Second insert refused: duplicate"),
        other => println!("[2] Unexpected result: {other:?}"),
    }

    // ── Add risks and a rating in one transaction ───────────────────────────
    let register_id = register.risk_register_id.clone();
    pgshape::transaction!(client, tx, {
        for (id, name) in [("r1", "Phishing Risk"), ("r2", "Vendor Lock-in")] {
            qb::insert("risks")
                .values(&CreateRisk {
                    risk_id: id.into(),
                    risk_register_id: register_id.clone(),
                    name: name.into(),
                    category: "operational".into(),
                })
                .on_conflict_do_nothing(&["risk_id"])
                .execute(&tx)
                .await?;
        }
        qb::insert("risk_ratings")
            .values(&CreateRiskRating {
                risk_id: "r1".into(),
                likelihood: 4,
                impact: 5,
                rated_by: "u-1".into(),
            })
            .execute(&tx)
            .await?;
        Ok(())
    })?;
    println!("[3] Added risks r1, r2 and rated r1");

    // ── Read risks with their ratings ───────────────────────────────────────
    let rated: Vec<RatedRisk> = qb::select_as("risks", "risk")
        .select_fields(&["risk_id", "name"])
        .join(
            Join::left("risk_ratings", JoinOn::eq("rt.risk_id", "risk.risk_id"))
                .alias("rt")
                .shape::<RatingJoin>(),
        )
        .select_joins()
        .eq("risk_register_id", &register_id)
        .order_by_asc("risk.risk_id")
        .fetch_all_as(&client)
        .await?;
    for risk in &rated {
        println!(
            "[4] {} {}: likelihood={:?} impact={:?}",
            risk.risk_id, risk.name, risk.rt_likelihood, risk.rt_impact
        );
    }

    let total = qb::select("risks").eq("risk_register_id", &register_id).count(&client).await?;
    println!("[5] Register holds {total} risks");

    // ── Close the register, then try to delete a missing risk ───────────────
    qb::update("risk_registers")
        .values(&CloseRiskRegister {
            status: "closed".into(),
        })
        .eq("risk_register_id", &register_id)
        .check_exists(ConditionSet::new().eq("risk_register_id", &register_id))
        .execute(&client)
        .await?;
    let current: Option<ReadRiskRegister> = qb::select("risk_registers")
        .eq("risk_register_id", &register_id)
        .fetch_one_as(&client)
        .await?;
    println!("[6] Register after close: {current:?}");

    match qb::delete("risks")
        .eq("risk_id", "r404")
        .check_exists_where()
        .execute(&client)
        .await
    {
        Err(err) if err.is_not_found() => println!("[7] {err}"),
        other => println!("[7] Unexpected result: {other:?}"),
    }

    Ok(())
}
