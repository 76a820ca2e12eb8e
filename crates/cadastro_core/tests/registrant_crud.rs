use cadastro_core::db::migrations::latest_version;
use cadastro_core::{
    ConnectionProvider, FailureKind, RegistrantDraft, RegistrantRepository, RegistrantService,
    RepoError, SharedConnectionProvider, SqliteRegistrantRepository, Term,
};
use rusqlite::Connection;

type Repo = SqliteRegistrantRepository<SharedConnectionProvider>;

fn new_repo() -> Repo {
    let provider = SharedConnectionProvider::in_memory().unwrap();
    SqliteRegistrantRepository::try_new(provider).unwrap()
}

fn seed_lookups(repo: &Repo) {
    repo.provider()
        .acquire()
        .unwrap()
        .execute_batch(
            "INSERT INTO REGIAO (ID, PAIS_NOME) VALUES (1, 'Brasil'), (2, 'Portugal');
             INSERT INTO TERMO (ID, ACEITAR_TERMO) VALUES (1, 1), (2, 0);",
        )
        .unwrap();
}

fn ana() -> RegistrantDraft {
    RegistrantDraft::new("Ana", "123", "a@x.com", "p", "X", "pt")
}

fn row_count(repo: &Repo) -> i64 {
    repo.provider()
        .acquire()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM CADASTRO;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let repo = new_repo();

    let id = repo.create(&ana()).unwrap();
    let loaded = repo.get(id).unwrap().unwrap();

    assert_eq!(loaded.id, id);
    assert_eq!(loaded.name, "Ana");
    assert_eq!(loaded.phone, "123");
    assert_eq!(loaded.email, "a@x.com");
    assert_eq!(loaded.password, "p");
    assert_eq!(loaded.company, "X");
    assert_eq!(loaded.language, "pt");
    assert_eq!(loaded.draft(), ana());
    assert!(loaded.region.is_none());
    assert!(loaded.term.is_none());
}

#[test]
fn get_missing_returns_none() {
    let repo = new_repo();
    assert!(repo.get(404).unwrap().is_none());
}

#[test]
fn list_all_orders_by_ascending_id() {
    let repo = new_repo();
    repo.provider()
        .acquire()
        .unwrap()
        .execute_batch(
            "INSERT INTO CADASTRO (ID, NOME, TELEFONE, EMAIL, SENHA, EMPRESA, IDIOMA)
             VALUES
                (30, 'C', '3', 'c@x.com', 'p', 'X', 'pt'),
                (10, 'A', '1', 'a@x.com', 'p', 'X', 'pt'),
                (20, 'B', '2', 'b@x.com', 'p', 'X', 'en');",
        )
        .unwrap();

    let ids: Vec<_> = repo
        .list_all()
        .unwrap()
        .into_iter()
        .map(|registrant| registrant.id)
        .collect();
    assert_eq!(ids, vec![10, 20, 30]);
}

#[test]
fn list_all_on_empty_table_is_empty() {
    let repo = new_repo();
    assert!(repo.list_all().unwrap().is_empty());
}

#[test]
fn update_replaces_scalars_and_keeps_associations() {
    let repo = new_repo();
    seed_lookups(&repo);

    let id = repo.create(&ana()).unwrap();
    repo.set_region(id, Some(1)).unwrap();
    repo.set_term(id, Some(1)).unwrap();

    let changed = RegistrantDraft::new("Ana Maria", "456", "ana@y.com", "q", "Y", "en");
    repo.update(id, &changed).unwrap();

    let loaded = repo.get(id).unwrap().unwrap();
    assert_eq!(loaded.draft(), changed);
    assert_eq!(loaded.region.map(|region| region.id), Some(1));
    assert_eq!(loaded.term, Some(Term { id: 1, accepted: true }));
}

#[test]
fn update_not_found_returns_not_found_and_leaves_table_unchanged() {
    let repo = new_repo();
    let id = repo.create(&ana()).unwrap();

    let err = repo
        .update(id + 100, &RegistrantDraft::new("Bia", "9", "b@x.com", "s", "Z", "es"))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id + 100));
    assert_eq!(err.kind(), FailureKind::NotFound);

    assert_eq!(row_count(&repo), 1);
    assert_eq!(repo.get(id).unwrap().unwrap().draft(), ana());
}

#[test]
fn delete_then_get_is_absent() {
    let repo = new_repo();
    let id = repo.create(&ana()).unwrap();

    repo.delete(id).unwrap();
    assert!(repo.get(id).unwrap().is_none());

    let err = repo.delete(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn lookups_return_rows_or_absent() {
    let repo = new_repo();
    seed_lookups(&repo);

    let region = repo.lookup_region(2).unwrap().unwrap();
    assert_eq!(region.country_name, "Portugal");
    let term = repo.lookup_term(2).unwrap().unwrap();
    assert!(!term.accepted);

    assert!(repo.lookup_region(99).unwrap().is_none());
    assert!(repo.lookup_term(99).unwrap().is_none());
}

#[test]
fn associations_hydrate_get_and_list() {
    let repo = new_repo();
    seed_lookups(&repo);

    let first = repo.create(&ana()).unwrap();
    let second = repo
        .create(&RegistrantDraft::new("Bia", "9", "b@x.com", "s", "Z", "es"))
        .unwrap();
    repo.set_region(first, Some(2)).unwrap();
    repo.set_term(second, Some(1)).unwrap();

    let listed = repo.list_all().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(
        listed[0].region.as_ref().map(|region| region.country_name.as_str()),
        Some("Portugal")
    );
    assert!(listed[0].term.is_none());
    assert!(listed[1].region.is_none());
    assert!(listed[1].has_accepted_terms());

    repo.set_region(first, None).unwrap();
    assert!(repo.get(first).unwrap().unwrap().region.is_none());
}

#[test]
fn associating_unknown_lookup_is_conflict() {
    let repo = new_repo();
    let id = repo.create(&ana()).unwrap();

    let err = repo.set_region(id, Some(77)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Conflict);

    let err = repo.set_term(id, Some(77)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Conflict);

    assert!(repo.get(id).unwrap().unwrap().region.is_none());
}

#[test]
fn associating_missing_registrant_is_not_found() {
    let repo = new_repo();
    seed_lookups(&repo);

    let err = repo.set_region(5, Some(1)).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(5)));
}

#[test]
fn dangling_reference_hydrates_as_absent() {
    let repo = new_repo();
    let id = repo.create(&ana()).unwrap();
    repo.provider()
        .acquire()
        .unwrap()
        .execute_batch(&format!(
            "PRAGMA foreign_keys = OFF;
             UPDATE CADASTRO SET REGIAO_ID = 99, TERMO_ID = 98 WHERE ID = {id};
             PRAGMA foreign_keys = ON;"
        ))
        .unwrap();

    let loaded = repo.get(id).unwrap().unwrap();
    assert!(loaded.region.is_none());
    assert!(loaded.term.is_none());
}

#[test]
fn free_form_scalars_are_stored_verbatim() {
    let repo = new_repo();

    let odd = RegistrantDraft::new("", "", "ana at x", "", "", "");
    let id = repo.create(&odd).unwrap();
    assert_eq!(repo.get(id).unwrap().unwrap().draft(), odd);

    let mut edited = ana();
    edited.email = String::new();
    edited.phone = "+55 (11) 9999-0000 ramal 2".to_string();
    repo.update(id, &edited).unwrap();
    assert_eq!(repo.get(id).unwrap().unwrap().draft(), edited);
    assert_eq!(row_count(&repo), 1);
}

#[test]
fn count_tracks_inserts_and_deletes() {
    let repo = new_repo();
    assert_eq!(repo.count().unwrap(), 0);

    let id = repo.create(&ana()).unwrap();
    repo.create(&ana()).unwrap();
    assert_eq!(repo.count().unwrap(), 2);

    repo.delete(id).unwrap();
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn service_register_creates_and_associates() {
    let repo = new_repo();
    seed_lookups(&repo);
    let service = RegistrantService::new(repo);

    let registrant = service.register(&ana(), Some(1), Some(1)).unwrap();
    assert_eq!(
        registrant.region.as_ref().map(|region| region.country_name.as_str()),
        Some("Brasil")
    );
    assert!(registrant.has_accepted_terms());
    assert_eq!(service.count_registrants().unwrap(), 1);
}

#[test]
fn service_register_removes_row_when_association_fails() {
    let repo = new_repo();
    seed_lookups(&repo);
    let service = RegistrantService::new(repo);

    let err = service.register(&ana(), Some(1), Some(42)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Conflict);
    assert!(service.list_registrants().unwrap().is_empty());
}

#[test]
fn service_wraps_repository_calls() {
    let service = RegistrantService::new(new_repo());

    let id = service.create_registrant(&ana()).unwrap();
    service
        .update_registrant(id, &RegistrantDraft::new("Ana", "000", "a@x.com", "p", "X", "pt"))
        .unwrap();
    assert_eq!(service.get_registrant(id).unwrap().unwrap().phone, "000");
    assert!(service.find_region(1).unwrap().is_none());

    service.delete_registrant(id).unwrap();
    assert!(service.get_registrant(id).unwrap().is_none());
}

#[test]
fn serialized_registrant_omits_password() {
    let repo = new_repo();
    let id = repo.create(&ana()).unwrap();
    let loaded = repo.get(id).unwrap().unwrap();

    let json = serde_json::to_value(&loaded).unwrap();
    assert_eq!(json["name"], "Ana");
    assert!(json.get("password").is_none());
    assert!(json["region"].is_null());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let provider = SharedConnectionProvider::new(Connection::open_in_memory().unwrap());

    match SqliteRegistrantRepository::try_new(provider) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_registrant_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRegistrantRepository::try_new(SharedConnectionProvider::new(conn));
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("CADASTRO"))
    ));
}

#[test]
fn repository_rejects_registrant_table_missing_columns() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE CADASTRO (ID INTEGER PRIMARY KEY, NOME TEXT NOT NULL);
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();

    let result = SqliteRegistrantRepository::try_new(SharedConnectionProvider::new(conn));
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "CADASTRO",
            column: "TELEFONE"
        })
    ));
}

#[test]
fn legacy_term_flags_decode_any_non_zero_as_accepted() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE REGIAO (ID INTEGER PRIMARY KEY, PAIS_NOME TEXT NOT NULL);
         CREATE TABLE TERMO (ID INTEGER PRIMARY KEY, ACEITAR_TERMO INTEGER NOT NULL);
         CREATE TABLE CADASTRO (
             ID INTEGER PRIMARY KEY AUTOINCREMENT,
             NOME TEXT NOT NULL,
             TELEFONE TEXT NOT NULL,
             EMAIL TEXT NOT NULL,
             SENHA TEXT NOT NULL,
             EMPRESA TEXT NOT NULL,
             IDIOMA TEXT NOT NULL,
             REGIAO_ID INTEGER,
             TERMO_ID INTEGER
         );
         INSERT INTO TERMO (ID, ACEITAR_TERMO) VALUES (1, 2), (2, -1), (3, 0);
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();
    let repo = SqliteRegistrantRepository::try_new(SharedConnectionProvider::new(conn)).unwrap();

    for term_id in [1, 2, 3] {
        let id = repo.create(&ana()).unwrap();
        repo.set_term(id, Some(term_id)).unwrap();
    }

    assert_eq!(repo.lookup_term(1).unwrap(), Some(Term { id: 1, accepted: true }));
    let accepted: Vec<bool> = repo
        .list_all()
        .unwrap()
        .iter()
        .map(|registrant| registrant.has_accepted_terms())
        .collect();
    assert_eq!(accepted, vec![true, true, false]);
}
