use app_config::{RawSettings, Settings};
use chrono::{DateTime, Duration, TimeZone, Utc};
use core_types::{Bar, OrderId, Signal};
use engine::{feed, simulated_runner};
use events::{EngineEvent, RecordingSink};
use futures::StreamExt;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::watch;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap()
}

fn settings(period: i64, taker_fee: Decimal) -> Settings {
    let mut raw = RawSettings::default();
    raw.strategy.volatility_period = period;
    raw.simulation.taker_fee = taker_fee;
    Settings::try_from(raw).unwrap()
}

fn bars(ohlc: &[(Decimal, Decimal, Decimal, Decimal)]) -> Vec<Bar> {
    ohlc.iter()
        .enumerate()
        .map(|(i, (o, h, l, c))| Bar::new(start() + Duration::minutes(i as i64), *o, *h, *l, *c).unwrap())
        .collect()
}

fn calm() -> (Decimal, Decimal, Decimal, Decimal) {
    (dec!(100), dec!(100.1), dec!(99.9), dec!(100))
}

#[tokio::test]
async fn quiet_market_never_trades() {
    let sink = RecordingSink::new();
    let input = bars(&vec![calm(); 30]);
    let mut runner = simulated_runner(&settings(4, dec!(0.001)), feed::from_bars(input), Box::new(sink.clone())).unwrap();
    let (_tx, shutdown) = watch::channel(false);

    let report = runner.run(shutdown).await.unwrap();

    assert_eq!(report.bars_processed, 30);
    assert_eq!(report.orders_submitted, 0);
    assert!(report.trades.is_empty());
    assert_eq!(report.final_equity, dec!(10000));
    assert!(!report.halted);
    assert!(sink.anomalies().is_empty());
}

#[tokio::test]
async fn breakout_round_trip_with_fees() {
    let sink = RecordingSink::new();
    let input = bars(&[
        calm(),
        calm(),
        calm(),
        // ATR 0.9, threshold 1.35, body 3: enter 97 at 103
        (dec!(100), dec!(103), dec!(100), dec!(103)),
        // entry fills at 103
        (dec!(103), dec!(103.5), dec!(102.5), dec!(103)),
        // close >= 105.06: take profit
        (dec!(103), dec!(106), dec!(103), dec!(106)),
        // exit fills at 106
        (dec!(106), dec!(106), dec!(106), dec!(106)),
    ]);
    let mut runner = simulated_runner(&settings(4, dec!(0.0005)), feed::from_bars(input), Box::new(sink.clone())).unwrap();
    let (_tx, shutdown) = watch::channel(false);

    let report = runner.run(shutdown).await.unwrap();

    assert_eq!(report.orders_submitted, 2);
    assert_eq!(report.trades.len(), 1);
    let trade = report.trades[0];
    // entry fee 97 * 103 * 0.0005 = 4.9955, exit fee 97 * 106 * 0.0005 = 5.141
    assert_eq!(trade.gross_pnl, dec!(291));
    assert_eq!(trade.net_pnl, dec!(280.8635));
    assert_eq!(report.net_pnl, dec!(280.8635));
    assert_eq!(report.final_cash, dec!(10280.8635));
    assert_eq!(report.final_equity, dec!(10280.8635));
    assert!(report.position.is_flat());

    let closes = sink.events().iter().filter(|e| matches!(e, EngineEvent::TradeClosed(_))).count();
    assert_eq!(closes, 1);
    assert!(matches!(sink.events().last(), Some(EngineEvent::RunEnded(_))));
}

#[tokio::test]
async fn shutdown_before_start_processes_nothing() {
    let sink = RecordingSink::new();
    let input = bars(&vec![calm(); 10]);
    let mut runner = simulated_runner(&settings(4, dec!(0)), feed::from_bars(input), Box::new(sink.clone())).unwrap();
    let (tx, shutdown) = watch::channel(false);
    tx.send(true).unwrap();

    let report = runner.run(shutdown).await.unwrap();
    assert!(report.halted);
    assert_eq!(report.bars_processed, 0);
}

#[tokio::test]
async fn shutdown_stops_a_waiting_run() {
    let sink = RecordingSink::new();
    // Three bars, then a feed that never yields again.
    let input = feed::from_bars(bars(&vec![calm(); 3])).chain(futures::stream::pending());
    let mut runner = simulated_runner(&settings(4, dec!(0)), input, Box::new(sink.clone())).unwrap();
    let (tx, shutdown) = watch::channel(false);

    let handle = tokio::spawn(async move { runner.run(shutdown).await });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    tx.send(true).unwrap();

    let report = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("runner should stop")
        .unwrap()
        .unwrap();
    assert!(report.halted);
    assert_eq!(report.bars_processed, 3);
}

fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((90i64..110, -3i64..=6, 0i64..3, 0i64..3), 1..120).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (open, body, up, down))| {
                let open = Decimal::from(open);
                let close = open + Decimal::from(body);
                let high = open.max(close) + Decimal::from(up);
                let low = open.min(close) - Decimal::from(down);
                Bar::new(start() + Duration::minutes(i as i64), open, high, low, close).unwrap()
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn runs_respect_order_and_position_invariants(input in arb_bars(), period in 1i64..6) {
        let sink = RecordingSink::new();
        let bar_count = input.len() as u64;
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let report = rt.block_on(async {
            let mut runner = simulated_runner(&settings(period, dec!(0.001)), feed::from_bars(input), Box::new(sink.clone())).unwrap();
            let (_tx, shutdown) = watch::channel(false);
            runner.run(shutdown).await.unwrap()
        });

        prop_assert_eq!(report.bars_processed, bar_count);
        prop_assert!(report.position.size >= Decimal::ZERO);
        prop_assert!(sink.anomalies().is_empty());

        let mut in_flight: Option<OrderId> = None;
        let mut evaluated = 0usize;
        let mut closed = 0usize;
        for event in sink.events() {
            match event {
                EngineEvent::SignalEvaluated(s) => {
                    evaluated += 1;
                    if evaluated < period as usize {
                        prop_assert!(s.volatility.is_none());
                        prop_assert_eq!(s.signal, Signal::Hold);
                    }
                }
                EngineEvent::OrderSubmitted(o) => {
                    prop_assert!(in_flight.is_none(), "second order while {:?} in flight", in_flight);
                    prop_assert!(o.size > Decimal::ZERO);
                    in_flight = Some(o.order_id);
                }
                EngineEvent::OrderFilled(o) => {
                    prop_assert_eq!(in_flight, Some(o.id));
                    in_flight = None;
                }
                EngineEvent::OrderRejected { order_id: Some(id), .. } | EngineEvent::OrderCanceled { order_id: id } => {
                    prop_assert_eq!(in_flight, Some(id));
                    in_flight = None;
                }
                EngineEvent::TradeClosed(_) => closed += 1,
                _ => {}
            }
        }
        prop_assert_eq!(closed, report.trades.len());
    }
}
