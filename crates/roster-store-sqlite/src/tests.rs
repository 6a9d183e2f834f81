//! Integration tests for `SqliteStore` against an in-memory database.

use roster_core::{
  editors::{AgendaInput, add_agenda_entry},
  store::{StudentPersistence, StudentStore},
  student::{NewStudent, Profile, Student, StudentStatus},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn student(name: &str) -> Student {
  let mut scratch = StudentStore::loaded(Vec::new());
  scratch
    .create(NewStudent::new(Profile {
      name:             name.into(),
      class_name:       "4º Ano A".into(),
      guardian_name:    "Paula".into(),
      guardian_contact: "paula@example.com".into(),
      ..Profile::default()
    }))
    .unwrap()
}

#[tokio::test]
async fn empty_store_loads_nothing() {
  let s = store().await;
  assert!(s.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_then_load_roundtrips_aggregate() {
  let s = store().await;
  let a = student("Ana");
  let a = add_agenda_entry(
    &a,
    AgendaInput {
      date:    chrono::NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
      title:   "Feira de ciências".into(),
      message: "Trazer maquete".into(),
    },
    chrono::Utc::now(),
  )
  .unwrap();

  s.upsert(&a).await.unwrap();
  let loaded = s.load_all().await.unwrap();
  assert_eq!(loaded, vec![a]);
}

#[tokio::test]
async fn upsert_replaces_by_id_and_keeps_insertion_order() {
  let s = store().await;
  let a = student("Ana");
  let b = student("Bia");
  s.upsert(&a).await.unwrap();
  s.upsert(&b).await.unwrap();

  let mut a2 = a.clone();
  a2.status = StudentStatus::Transferred;
  s.upsert(&a2).await.unwrap();

  let loaded = s.load_all().await.unwrap();
  assert_eq!(s.count().await.unwrap(), 2);
  assert_eq!(loaded[0], a2);
  assert_eq!(loaded[1], b);
}

#[tokio::test]
async fn load_is_idempotent() {
  let s = store().await;
  s.upsert(&student("Ana")).await.unwrap();
  let first = s.load_all().await.unwrap();
  let second = s.load_all().await.unwrap();
  assert_eq!(first, second);

  let mut memory = StudentStore::new();
  memory.hydrate(first);
  memory.hydrate(second);
  assert_eq!(memory.len(), 1);
}

#[tokio::test]
async fn drained_writes_persist() {
  let s = store().await;
  let mut memory = StudentStore::loaded(s.load_all().await.unwrap());
  let created = memory.create(NewStudent::new(student("Caio").profile)).unwrap();
  for pending in memory.drain_pending_writes() {
    s.upsert(&pending).await.unwrap();
  }

  let reloaded = StudentStore::loaded(s.load_all().await.unwrap());
  assert_eq!(reloaded.get(created.id()), Some(&created));
}

#[tokio::test]
async fn mismatched_row_key_is_rejected() {
  let s = store().await;
  let a = student("Ana");
  let doc = serde_json::to_string(&a).unwrap();
  let wrong = uuid::Uuid::new_v4().hyphenated().to_string();
  s.conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO students (student_id, updated_at, document) VALUES (?1, ?2, ?3)",
        rusqlite::params![wrong, "2024-01-01T00:00:00+00:00", doc],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  assert!(matches!(s.load_all().await, Err(Error::IdMismatch { .. })));
}
