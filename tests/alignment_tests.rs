//! Sample-and-hold alignment behavior, end to end.

use chronoflow::prelude::*;

fn ts(ms: u64) -> Timestamp {
    Timestamp::from_millis(ms)
}

/// A data stream, a clock stream, a repeater between them, and a collector
/// observing the realigned output.
struct Rig {
    pipeline: Pipeline,
    data: Producer<String>,
    clock: Producer<u64>,
    out: CollectorHandle<String>,
}

fn rig(initial: Option<String>) -> Rig {
    let mut pipeline = Pipeline::new();
    let data = pipeline.input::<String>("data");
    let clock = pipeline.input::<u64>("clock");
    let hold = Repeater::<String>::build::<u64>(&mut pipeline, "hold", initial);
    let collector = Collector::new();
    let out = collector.handle();
    let sink = pipeline.add_sink("sink", collector);

    pipeline.connect(data.port(), hold.data).unwrap();
    pipeline.connect(clock.port(), hold.clock).unwrap();
    pipeline.connect(hold.out, sink).unwrap();
    pipeline.start().unwrap();

    Rig {
        pipeline,
        data,
        clock,
        out,
    }
}

/// Clock ticks before any data has arrived produce nothing.
#[tokio::test]
async fn test_ticks_before_any_data_produce_nothing() {
    let mut rig = rig(None);

    rig.clock.post(0, ts(1000)).unwrap();
    rig.clock.post(1, ts(2000)).unwrap();
    rig.clock.post(2, ts(3000)).unwrap();

    rig.pipeline.drain().await.unwrap();
    assert!(rig.out.is_empty());
    rig.pipeline.stop().await;
}

/// Data at t=1, tick at t=2: exactly one output carrying the data payload
/// under the clock's originating time.
#[tokio::test]
async fn test_tick_reemits_latest_value_with_clock_time() {
    let mut rig = rig(None);

    rig.data.post("A".into(), ts(1000)).unwrap();
    rig.clock.post(0, ts(2000)).unwrap();

    rig.pipeline.drain().await.unwrap();
    let messages = rig.out.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].payload(), "A");
    assert_eq!(messages[0].originating_time(), ts(2000));
    rig.pipeline.stop().await;
}

/// Several data messages between two ticks: only the latest survives.
#[tokio::test]
async fn test_last_value_wins_between_ticks() {
    let mut rig = rig(None);

    rig.data.post("A".into(), ts(1000)).unwrap();
    rig.data.post("B".into(), ts(1500)).unwrap();
    rig.clock.post(0, ts(2000)).unwrap();

    rig.pipeline.drain().await.unwrap();
    let messages = rig.out.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].payload(), "B");
    assert_eq!(messages[0].originating_time(), ts(2000));
    rig.pipeline.stop().await;
}

/// A seeded repeater re-emits its initial value for ticks that precede the
/// first data message.
#[tokio::test]
async fn test_seeded_repeater_emits_initial_before_first_data() {
    let mut rig = rig(Some("D".into()));

    rig.clock.post(0, ts(1000)).unwrap();

    rig.pipeline.drain().await.unwrap();
    let messages = rig.out.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].payload(), "D");
    assert_eq!(messages[0].originating_time(), ts(1000));
    rig.pipeline.stop().await;
}

/// The output's originating time is the tick's, even when the held value is
/// newer than the tick.
#[tokio::test]
async fn test_output_time_follows_clock_not_data() {
    let mut rig = rig(None);

    rig.data.post("A".into(), ts(5000)).unwrap();
    rig.clock.post(0, ts(2000)).unwrap();

    rig.pipeline.drain().await.unwrap();
    let messages = rig.out.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].originating_time(), ts(2000));
    rig.pipeline.stop().await;
}

/// Without new data, every tick re-emits the same held value.
#[tokio::test]
async fn test_every_tick_reemits_held_value() {
    let mut rig = rig(None);

    rig.data.post("A".into(), ts(1000)).unwrap();
    rig.clock.post(0, ts(2000)).unwrap();
    rig.clock.post(1, ts(3000)).unwrap();
    rig.clock.post(2, ts(4000)).unwrap();

    rig.pipeline.drain().await.unwrap();
    let messages = rig.out.messages();
    assert_eq!(messages.len(), 3);
    for (message, expected) in messages.iter().zip([2000u64, 3000, 4000]) {
        assert_eq!(message.payload(), "A");
        assert_eq!(message.originating_time(), ts(expected));
    }
    rig.pipeline.stop().await;
}

/// Mutating the caller's value after posting never changes what the repeater
/// later emits: the held value is an owned copy.
#[tokio::test]
async fn test_held_value_is_isolated_from_the_original() {
    let mut pipeline = Pipeline::new();
    let data = pipeline.input::<Vec<i32>>("data");
    let clock = pipeline.input::<u64>("clock");
    let hold = Repeater::<Vec<i32>>::build::<u64>(&mut pipeline, "hold", None);
    let collector = Collector::<Vec<i32>>::new();
    let out = collector.handle();
    let sink = pipeline.add_sink("sink", collector);
    pipeline.connect(data.port(), hold.data).unwrap();
    pipeline.connect(clock.port(), hold.clock).unwrap();
    pipeline.connect(hold.out, sink).unwrap();
    pipeline.start().unwrap();

    let mut data_port = data;
    let mut clock_port = clock;
    let mut original = vec![1, 2, 3];
    data_port.post(original.clone(), ts(1000)).unwrap();
    original.push(4);

    clock_port.post(0, ts(2000)).unwrap();
    pipeline.drain().await.unwrap();

    assert_eq!(out.payloads(), vec![vec![1, 2, 3]]);
    pipeline.stop().await;
}

/// A repeater fed by a real Timer clock keeps re-emitting the newest sample.
#[tokio::test]
async fn test_repeater_with_timer_clock() {
    let mut pipeline = Pipeline::new();
    let mut sensor = pipeline.input::<f64>("sensor");
    let clock = pipeline.add_source(
        "clock",
        Timer::new(),
        std::time::Duration::from_millis(5),
    );
    let hold = Repeater::<f64>::build::<u64>(&mut pipeline, "hold", None);
    let collector = Collector::<f64>::new();
    let out = collector.handle();
    let sink = pipeline.add_sink("sink", collector);
    pipeline.connect(sensor.port(), hold.data).unwrap();
    pipeline.connect(clock, hold.clock).unwrap();
    pipeline.connect(hold.out, sink).unwrap();
    pipeline.start().unwrap();

    sensor.post(21.5, Timestamp::now()).unwrap();

    // wait until the clock has driven at least two re-emissions
    for _ in 0..200 {
        if out.len() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert!(out.len() >= 2);
    assert!(out.payloads().iter().all(|v| *v == 21.5));

    let times: Vec<Timestamp> = out
        .messages()
        .iter()
        .map(|message| message.originating_time())
        .collect();
    assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));

    pipeline.stop().await;
}
