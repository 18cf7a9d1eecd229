use parking_billing::application::parking::Parking;
use parking_billing::domain::tariff::Tariff;
use parking_billing::domain::vehicle::{Balance, Vehicle, VehicleType};
use parking_billing::error::ParkingError;
use parking_billing::infrastructure::manual_trigger::ManualTrigger;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::Ordering;

mod common;

#[tokio::test]
async fn test_single_place_lifecycle() {
    let t = common::open_parking(1).await;
    let parking = &t.parking;

    parking
        .add_vehicle(Vehicle::new("AA-1111-BB", VehicleType::PassengerCar, dec!(5.0)).unwrap())
        .await
        .unwrap();

    let second = Vehicle::new("CC-2222-DD", VehicleType::Truck, dec!(5.0)).unwrap();
    assert!(matches!(
        parking.add_vehicle(second).await,
        Err(ParkingError::CapacityExceeded { .. })
    ));

    parking.charge_vehicles().await;
    assert_eq!(
        parking.vehicles().await[0].balance(),
        Balance::new(dec!(3.0))
    );
    assert_eq!(parking.balance().await, Balance::new(dec!(2.0)));

    parking.remove_vehicle("AA-1111-BB").await.unwrap();
    assert!(parking.vehicles().await.is_empty());
    assert_eq!(parking.free_places().await, 1);
    // Collected fees stay with the parking after the vehicle leaves.
    assert_eq!(parking.balance().await, Balance::new(dec!(2.0)));

    let log = parking.read_log().await.unwrap();
    assert!(log.contains("[Parking] Vehicle added | ID: AA-1111-BB"));
    assert!(log.contains("[Parking] Add failed | Vehicle CC-2222-DD | Reason: parking is full"));
    assert!(log.contains("[Transaction] Charge | Vehicle: AA-1111-BB | Sum: 2"));
    assert!(log.contains("[Parking] Vehicle removed | ID: AA-1111-BB"));
}

#[tokio::test]
async fn test_aggregate_balance_matches_charge_history() {
    let t = common::open_parking(4).await;
    for (id, vehicle_type, balance) in [
        ("AA-0001-AA", VehicleType::PassengerCar, dec!(3)),
        ("BB-0002-BB", VehicleType::Truck, dec!(12)),
        ("CC-0003-CC", VehicleType::Bus, dec!(0)),
        ("DD-0004-DD", VehicleType::Motorcycle, dec!(1.5)),
    ] {
        t.parking
            .add_vehicle(Vehicle::new(id, vehicle_type, balance).unwrap())
            .await
            .unwrap();
    }

    for round in 0..5 {
        t.billing.fire().await.unwrap();
        if round == 2 {
            t.parking.top_up_vehicle("CC-0003-CC", dec!(50)).await.unwrap();
        }
    }

    let transactions = t.parking.transactions().await;
    let charged: rust_decimal::Decimal = transactions
        .iter()
        .filter(|record| record.is_charge())
        .map(|record| record.sum)
        .sum();
    assert_eq!(t.parking.balance().await, Balance::new(charged));
    assert_eq!(transactions.iter().filter(|r| r.is_charge()).count(), 20);
    assert_eq!(transactions.len(), 21);
}

#[tokio::test]
async fn test_failing_log_does_not_break_operations() {
    let sink = common::FailingLogSink::default();
    let attempts = sink.attempts.clone();
    let billing = Arc::new(ManualTrigger::new());
    let status = Arc::new(ManualTrigger::new());
    let parking = Parking::open(
        &common::settings(3),
        Tariff::default(),
        Box::new(sink),
        billing.clone(),
        status.clone(),
    )
    .await
    .unwrap();

    parking
        .add_vehicle(Vehicle::new("AA-1111-BB", VehicleType::Bus, dec!(10)).unwrap())
        .await
        .unwrap();
    parking
        .add_vehicle(Vehicle::new("CC-2222-DD", VehicleType::Truck, dec!(10)).unwrap())
        .await
        .unwrap();

    billing.fire().await.unwrap();
    // The status callback reports the failure instead of panicking.
    status.fire().await.unwrap();

    assert_eq!(parking.balance().await, Balance::new(dec!(8.5)));
    assert_eq!(parking.transactions().await.len(), 2);
    assert!(parking.log_status().await.is_err());
    assert!(attempts.load(Ordering::SeqCst) > 0);

    parking.shutdown().await;
}

#[tokio::test]
async fn test_status_snapshots_follow_state() {
    let t = common::open_parking(2).await;
    t.status.fire().await.unwrap();
    t.parking
        .add_vehicle(Vehicle::new("AA-1111-BB", VehicleType::Truck, dec!(1)).unwrap())
        .await
        .unwrap();
    t.billing.fire().await.unwrap();
    t.status.fire().await.unwrap();

    let statuses: Vec<String> = t
        .log
        .lines()
        .await
        .into_iter()
        .filter(|line| line.contains("[Parking] Status"))
        .collect();
    assert_eq!(statuses.len(), 2);
    assert!(statuses[0].ends_with("Balance: 0 | Free places: 2"));
    assert!(statuses[1].ends_with("Balance: 15 | Free places: 1"));
}

#[tokio::test]
async fn test_shutdown_twice_closes_once() {
    let t = common::open_parking(2).await;
    t.parking.shutdown().await;
    let lines_after_first = t.log.lines().await.len();
    t.parking.shutdown().await;

    assert_eq!(t.log.lines().await.len(), lines_after_first);
    assert!(t.log.is_closed());
    assert!(matches!(
        t.parking.read_log().await,
        Err(ParkingError::Disposed(_))
    ));
    assert!(matches!(
        t.parking.top_up_vehicle("AA-1111-BB", dec!(1)).await,
        Err(ParkingError::Disposed(_))
    ));
}
