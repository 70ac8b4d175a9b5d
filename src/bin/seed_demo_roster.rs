// ==========================================
// 礼物交换抽签系统 - 演示名单
// ==========================================
// 用法: seed_demo_roster [db_path]
// 重复执行安全: 已存在的邮箱跳过
// ==========================================

use std::error::Error;
use std::sync::{Arc, Mutex};

use secret_santa::app::get_default_db_path;
use secret_santa::db::{init_schema, open_sqlite_connection};
use secret_santa::domain::{GroupTag, NewParticipant};
use secret_santa::logging;
use secret_santa::repository::ParticipantRepository;

/// (first_name, last_name, email, family_unit)
const DEMO_ROSTER: &[(&str, &str, &str, i64)] = &[
    ("Alice", "Wonderland", "alice@example.com", 1),
    ("Bob", "Biscuit", "bob@example.com", 1),
    ("Charlie", "Chestnut", "charlie@example.com", 2),
    ("Carol", "Chestnut", "carol@example.com", 2),
    ("Daisy", "Dazzle", "daisy@example.com", 3),
    ("Dan", "Dazzle", "dan@example.com", 3),
    ("Eve", "Dazzle", "eve@example.com", 3),
];

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    tracing::info!(db_path = %db_path, "写入演示名单");

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let repo = ParticipantRepository::new(Arc::new(Mutex::new(conn)));

    let existing = repo.existing_emails()?;
    let missing: Vec<NewParticipant> = DEMO_ROSTER
        .iter()
        .filter(|(_, _, email, _)| !existing.contains(&email.to_lowercase()))
        .map(|(first, last, email, group)| NewParticipant {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            group: GroupTag(*group),
        })
        .collect();

    let inserted = repo.batch_insert(&missing)?;

    println!(
        "演示名单: 新增 {} 人，跳过 {} 人（已存在），当前共 {} 人",
        inserted.len(),
        DEMO_ROSTER.len() - inserted.len(),
        repo.count()?
    );

    Ok(())
}
