use std::sync::Arc;

use engine::{
    Amount, AuthGateway, EngineError, ExpenseRepository, SessionStore, TripId, TripRepository,
    UserId, memory::MemoryProvider,
};

struct Fixture {
    provider: Arc<MemoryProvider>,
    gateway: AuthGateway<MemoryProvider>,
    trips: TripRepository<MemoryProvider>,
    expenses: ExpenseRepository<MemoryProvider>,
}

fn fixture() -> Fixture {
    let provider = Arc::new(MemoryProvider::new());
    let session = SessionStore::new();
    Fixture {
        gateway: AuthGateway::new(Arc::clone(&provider), session.clone()),
        trips: TripRepository::new(Arc::clone(&provider), session.clone()),
        expenses: ExpenseRepository::new(Arc::clone(&provider), session),
        provider,
    }
}

fn amount(value: f64) -> Amount {
    Amount::new(value).unwrap()
}

#[tokio::test]
async fn created_trip_is_listed_for_its_owner() {
    let fx = fixture();
    let owner = fx
        .gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap()
        .id;

    let id = fx
        .trips
        .create_trip("Kandy", "Sri Lanka", &owner)
        .await
        .unwrap();

    let trips = fx.trips.list_trips_for_owner(&owner).await.unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].id, id);
    assert_eq!(trips[0].place, "Kandy");
    assert_eq!(trips[0].country, "Sri Lanka");
    assert_eq!(trips[0].owner_id, owner);
}

#[tokio::test]
async fn owner_without_trips_gets_an_empty_list() {
    let fx = fixture();

    let trips = fx
        .trips
        .list_trips_for_owner(&UserId::new("nobody"))
        .await
        .unwrap();

    assert!(trips.is_empty());
}

#[tokio::test]
async fn trips_are_isolated_by_owner() {
    let fx = fixture();
    let u1 = UserId::new("U1");
    let u2 = UserId::new("U2");

    fx.trips.create_trip("Kandy", "Sri Lanka", &u1).await.unwrap();
    fx.trips.create_trip("Oslo", "Norway", &u2).await.unwrap();

    let trips = fx.trips.list_trips_for_owner(&u1).await.unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].place, "Kandy");
    assert_eq!(trips[0].country, "Sri Lanka");
}

#[tokio::test]
async fn blank_trip_fields_fail_before_any_remote_call() {
    let fx = fixture();
    let owner = UserId::new("U1");

    for (place, country) in [("", ""), ("Kandy", ""), ("", "Sri Lanka"), ("  ", "Norway")] {
        let err = fx
            .trips
            .create_trip(place, country, &owner)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("Place and Country are required!".to_string())
        );
    }
    assert_eq!(fx.provider.remote_calls(), 0);
}

#[tokio::test]
async fn trip_fields_are_trimmed() {
    let fx = fixture();
    let owner = UserId::new("U1");

    fx.trips
        .create_trip("  Oslo ", " Norway", &owner)
        .await
        .unwrap();

    let trips = fx.trips.list_trips_for_owner(&owner).await.unwrap();
    assert_eq!(trips[0].place, "Oslo");
    assert_eq!(trips[0].country, "Norway");
}

#[tokio::test]
async fn duplicate_creates_are_not_deduplicated() {
    let fx = fixture();
    let owner = UserId::new("U1");

    let (a, b) = tokio::join!(
        fx.trips.create_trip("Kandy", "Sri Lanka", &owner),
        fx.trips.create_trip("Kandy", "Sri Lanka", &owner),
    );

    assert_ne!(a.unwrap(), b.unwrap());
    assert_eq!(fx.trips.list_trips_for_owner(&owner).await.unwrap().len(), 2);
}

#[tokio::test]
async fn provider_failures_surface_as_write_and_read_failures() {
    let fx = fixture();
    let owner = UserId::new("U1");
    fx.provider.set_offline(true);

    assert_eq!(
        fx.trips
            .create_trip("Kandy", "Sri Lanka", &owner)
            .await
            .unwrap_err(),
        EngineError::WriteFailed("network request failed".to_string())
    );
    assert_eq!(
        fx.trips.list_trips_for_owner(&owner).await.unwrap_err(),
        EngineError::ReadFailed("network request failed".to_string())
    );
    assert_eq!(
        fx.expenses
            .create_expense(&TripId::new("t1"), "ate bread", amount(4.0), "food")
            .await
            .unwrap_err(),
        EngineError::WriteFailed("network request failed".to_string())
    );
    assert_eq!(
        fx.expenses
            .list_expenses_for_trip(&TripId::new("t1"))
            .await
            .unwrap_err(),
        EngineError::ReadFailed("network request failed".to_string())
    );
}

#[tokio::test]
async fn created_expense_is_listed_for_its_trip() {
    let fx = fixture();
    let trip = fx
        .trips
        .create_trip("Kandy", "Sri Lanka", &UserId::new("U1"))
        .await
        .unwrap();

    let id = fx
        .expenses
        .create_expense(&trip, "bought a shoes", amount(50.0), "shopping")
        .await
        .unwrap();

    let expenses = fx.expenses.list_expenses_for_trip(&trip).await.unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].id, id);
    assert_eq!(expenses[0].trip_id, trip);
    assert_eq!(expenses[0].title, "bought a shoes");
    assert_eq!(expenses[0].amount, amount(50.0));
    assert_eq!(expenses[0].category, "shopping");
}

#[tokio::test]
async fn expenses_are_isolated_by_trip() {
    let fx = fixture();
    let owner = UserId::new("U1");
    let kandy = fx.trips.create_trip("Kandy", "Sri Lanka", &owner).await.unwrap();
    let oslo = fx.trips.create_trip("Oslo", "Norway", &owner).await.unwrap();

    fx.expenses
        .create_expense(&kandy, "ate bread", amount(4.0), "food")
        .await
        .unwrap();
    fx.expenses
        .create_expense(&oslo, "watched spiderman", amount(100.0), "entertainment")
        .await
        .unwrap();
    fx.expenses
        .create_expense(&kandy, "tuk tuk", amount(2.5), "commute")
        .await
        .unwrap();

    let expenses = fx.expenses.list_expenses_for_trip(&kandy).await.unwrap();
    assert_eq!(expenses.len(), 2);
    assert!(expenses.iter().all(|e| e.trip_id == kandy));
    assert!(
        fx.expenses
            .list_expenses_for_trip(&TripId::new("unknown"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn blank_expense_fields_fail_before_any_remote_call() {
    let fx = fixture();
    let trip = TripId::new("t1");

    assert!(matches!(
        fx.expenses.create_expense(&trip, "", amount(1.0), "food").await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        fx.expenses.create_expense(&trip, "bread", amount(1.0), " ").await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        fx.expenses
            .create_expense(&TripId::new(""), "bread", amount(1.0), "food")
            .await,
        Err(EngineError::Validation(_))
    ));
    assert_eq!(fx.provider.remote_calls(), 0);
}

#[tokio::test]
async fn repositories_read_the_session_at_call_time() {
    let fx = fixture();
    let ada = fx
        .gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap()
        .id;
    fx.trips.create_trip("Kandy", "Sri Lanka", &ada).await.unwrap();
    fx.gateway.sign_out().await;

    let bob = fx
        .gateway
        .sign_up("bob@example.com", "builder")
        .await
        .unwrap()
        .id;
    let current = fx.gateway.session().current_user().unwrap().id;

    assert_eq!(current, bob);
    assert!(fx.trips.list_trips_for_owner(&current).await.unwrap().is_empty());
}
