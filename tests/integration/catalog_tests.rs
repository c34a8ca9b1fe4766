//! Catalog integration tests against a real SQLite file

use rand::{rngs::StdRng, Rng, SeedableRng};

use lms_engine::{
    config::AppConfig,
    models::{CreateBook, CreateMember, Genre},
    repository::Repository,
    AppError, AppResult, Catalog,
};

fn temp_config(dir: &tempfile::TempDir) -> AppConfig {
    AppConfig::with_database_url(format!("sqlite://{}", dir.path().join("library.db").display()))
}

async fn open_catalog(config: &AppConfig) -> Catalog<Repository> {
    let repository = Repository::open(&config.database, &config.catalog)
        .await
        .expect("Failed to open store");
    Catalog::open(repository).await.expect("Failed to load catalog")
}

fn dune() -> CreateBook {
    CreateBook::new("Dune", "0441013593", "Herbert", "science")
}

fn ada() -> CreateMember {
    CreateMember::new("Ada", "1 Infinite Loop")
}

#[tokio::test]
async fn test_checkout_and_return_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open_catalog(&temp_config(&dir)).await;

    let book_id = catalog.add_book(dune()).await.unwrap().id();
    let member_id = catalog.add_member(ada()).await.unwrap().id();

    catalog.check_out_book(book_id, member_id).await.unwrap();
    let book = catalog.get_book(book_id).unwrap();
    assert!(book.is_borrowed());
    assert_eq!(book.issued_to(), member_id);
    assert_eq!(catalog.get_member(member_id).unwrap().borrowed_book_id(), book_id);

    assert!(matches!(
        catalog.check_out_book(book_id, member_id).await,
        Err(AppError::InvalidState(_))
    ));

    catalog.return_book(book_id, member_id).await.unwrap();
    let book = catalog.get_book(book_id).unwrap();
    assert!(!book.is_borrowed());
    assert_eq!(book.issued_to(), 0);
    assert_eq!(catalog.get_member(member_id).unwrap().borrowed_book_id(), 0);
    assert!(catalog.audit().is_empty());

    catalog.close().await;
}

#[tokio::test]
async fn test_failed_transactions_mutate_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open_catalog(&temp_config(&dir)).await;

    let book_id = catalog.add_book(dune()).await.unwrap().id();
    let member_id = catalog.add_member(ada()).await.unwrap().id();
    let books_before = catalog.list_books().to_vec();
    let members_before = catalog.list_members().to_vec();

    assert!(matches!(
        catalog.check_out_book(book_id + 100, member_id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        catalog.check_out_book(book_id, member_id + 100).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        catalog.return_book(book_id, member_id).await,
        Err(AppError::InvalidState(_))
    ));

    assert_eq!(catalog.list_books(), books_before.as_slice());
    assert_eq!(catalog.list_members(), members_before.as_slice());
    catalog.close().await;
}

#[tokio::test]
async fn test_return_by_other_member_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open_catalog(&temp_config(&dir)).await;

    let book_id = catalog.add_book(dune()).await.unwrap().id();
    let ada_id = catalog.add_member(ada()).await.unwrap().id();
    let grace_id = catalog
        .add_member(CreateMember::new("Grace", "Arlington"))
        .await
        .unwrap()
        .id();

    catalog.check_out_book(book_id, ada_id).await.unwrap();
    assert!(matches!(
        catalog.return_book(book_id, grace_id).await,
        Err(AppError::InvalidState(_))
    ));
    assert_eq!(catalog.get_book(book_id).unwrap().issued_to(), ada_id);
    catalog.close().await;
}

#[tokio::test]
async fn test_add_then_lookup_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open_catalog(&temp_config(&dir)).await;

    let id = catalog.add_book(dune()).await.unwrap().id();
    let book = catalog.lookup_book(id).expect("book should be present");
    assert_eq!(book.title(), "Dune");
    assert_eq!(book.isbn(), "0441013593");
    assert_eq!(book.author(), "Herbert");
    assert_eq!(book.genre(), Genre::Science);
    assert!(!book.is_borrowed());

    // Unparseable genres fall back instead of failing
    let odd = catalog
        .add_book(CreateBook::new("Untitled", "0000000000", "Anon", "poetry"))
        .await
        .unwrap();
    assert_eq!(odd.genre(), Genre::Unknown);
    catalog.close().await;
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_stable() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open_catalog(&temp_config(&dir)).await;

    catalog.add_book(dune()).await.unwrap();
    catalog
        .add_book(CreateBook::new("Children of Dune", "0441104029", "Herbert", "science"))
        .await
        .unwrap();
    catalog
        .add_book(CreateBook::new("Emma", "0141439580", "Austen", "romance"))
        .await
        .unwrap();

    let first: Vec<i64> = catalog.search_books("dune").iter().map(|b| b.id()).collect();
    let second: Vec<i64> = catalog.search_books("DUNE").iter().map(|b| b.id()).collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(catalog.search_books("austen").len(), 1);
    assert_eq!(catalog.search_books("0441104029").len(), 1);

    catalog.add_member(ada()).await.unwrap();
    assert_eq!(catalog.search_members("INFINITE").len(), 1);
    assert!(catalog.search_members("nobody").is_empty());
    catalog.close().await;
}

#[tokio::test]
async fn test_delete_removes_from_listing() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open_catalog(&temp_config(&dir)).await;

    let id = catalog.add_book(dune()).await.unwrap().id();
    assert!(catalog.delete_book(id, false).await.unwrap());
    assert!(catalog.list_books().iter().all(|b| b.id() != id));
    assert!(matches!(catalog.get_book(id), Err(AppError::NotFound(_))));
    assert!(!catalog.delete_book(id, false).await.unwrap());
    catalog.close().await;
}

#[tokio::test]
async fn test_delete_guard_and_force_return() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = open_catalog(&temp_config(&dir)).await;

    let book_id = catalog.add_book(dune()).await.unwrap().id();
    let member_id = catalog.add_member(ada()).await.unwrap().id();
    catalog.check_out_book(book_id, member_id).await.unwrap();

    assert!(matches!(
        catalog.delete_member(member_id, false).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(catalog.delete_member(member_id, true).await.unwrap());
    assert!(!catalog.get_book(book_id).unwrap().is_borrowed());
    assert!(catalog.audit().is_empty());
    catalog.close().await;
}

#[tokio::test]
async fn test_reload_restores_state_and_reseeds_ids() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_config(&dir);

    let (book_id, member_id) = {
        let mut catalog = open_catalog(&config).await;
        let book_id = catalog
            .add_book(dune().with_cover_image("covers/dune.jpg"))
            .await
            .unwrap()
            .id();
        let member_id = catalog.add_member(ada()).await.unwrap().id();
        catalog.check_out_book(book_id, member_id).await.unwrap();
        catalog.close().await;
        (book_id, member_id)
    };

    let mut catalog = open_catalog(&config).await;
    let book = catalog.get_book(book_id).unwrap();
    assert_eq!(book.cover_image(), Some("covers/dune.jpg"));
    assert!(book.is_borrowed());
    assert_eq!(book.issued_to(), member_id);
    assert_eq!(catalog.borrowed_book_of(member_id).unwrap().map(|b| b.id()), Some(book_id));
    assert!(catalog.audit().is_empty());

    let next = catalog
        .add_book(CreateBook::new("Emma", "0141439580", "Austen", "romance"))
        .await
        .unwrap();
    assert!(next.id() > book_id);
    catalog.close().await;
}

/// Existing id most of the time, an unknown one otherwise
fn pick(rng: &mut StdRng, ids: &[i64]) -> i64 {
    if ids.is_empty() || rng.gen_bool(0.1) {
        1
    } else {
        ids[rng.gen_range(0..ids.len())]
    }
}

/// Rejections are expected; persistence failures are not
fn accept_rejection<T>(step: usize, result: AppResult<T>) {
    if let Err(e) = result {
        assert!(
            matches!(e, AppError::NotFound(_) | AppError::InvalidState(_)),
            "step {}: unexpected error {}",
            step,
            e
        );
    }
}

#[tokio::test]
async fn test_invariant_holds_across_mixed_operations() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_config(&dir);
    let mut catalog = open_catalog(&config).await;
    let mut rng = StdRng::seed_from_u64(0x1b5);

    for step in 0..400 {
        let book_ids: Vec<i64> = catalog.list_books().iter().map(|b| b.id()).collect();
        let member_ids: Vec<i64> = catalog.list_members().iter().map(|m| m.id()).collect();
        let book_id = pick(&mut rng, &book_ids);
        let member_id = pick(&mut rng, &member_ids);

        match rng.gen_range(0..9) {
            0 => {
                let title = format!("Volume {}", step);
                let data = CreateBook::new(&title, "0441013593", "Herbert", "science");
                accept_rejection(step, catalog.add_book(data).await);
            }
            1 => {
                let mut data = CreateMember::new(&format!("Reader {}", step), "1 Infinite Loop");
                if rng.gen_bool(0.5) {
                    data.borrowed_book_id = book_id;
                }
                accept_rejection(step, catalog.add_member(data).await);
            }
            2 | 3 => accept_rejection(step, catalog.check_out_book(book_id, member_id).await),
            4 | 5 => {
                let holder = catalog.lookup_book(book_id).map(|b| b.issued_to()).unwrap_or(0);
                let returner = if holder != 0 && rng.gen_bool(0.7) { holder } else { member_id };
                accept_rejection(step, catalog.return_book(book_id, returner).await);
            }
            6 => accept_rejection(step, catalog.delete_book(book_id, false).await),
            7 => accept_rejection(step, catalog.delete_member(member_id, false).await),
            _ => {
                if rng.gen_bool(0.5) {
                    accept_rejection(step, catalog.delete_book(book_id, true).await);
                } else {
                    accept_rejection(step, catalog.delete_member(member_id, true).await);
                }
            }
        }

        let issues = catalog.audit();
        assert!(issues.is_empty(), "step {}: {:?}", step, issues);
    }

    let books = catalog.list_books().to_vec();
    let members = catalog.list_members().to_vec();
    catalog.close().await;

    let reloaded = open_catalog(&config).await;
    assert!(reloaded.audit().is_empty());
    assert_eq!(reloaded.list_books(), books.as_slice());
    assert_eq!(reloaded.list_members(), members.as_slice());
    reloaded.close().await;
}
