//! Device surfaces driven the way a user-space tool would drive them

use std::time::{Duration, Instant};

use simtemp_core::{record, Engine, InitialConfig, Mode, SampleFlags, SimTempError, RECORD_SIZE};
use simtemp_device::{
    ioctl::{SIMTEMP_GET_STATS, SIMTEMP_SET_SAMPLING},
    AsyncDeviceReader, AsyncSampleSource, Command, DeviceError, OpenFlags, PollMask,
    SimTempDevice,
};

fn fast_ramp_device() -> SimTempDevice {
    let engine = Engine::builder()
        .initial(InitialConfig::default().with_sampling_ms(10))
        .mode(Mode::Ramp)
        .build()
        .unwrap();
    SimTempDevice::with_engine(engine).unwrap()
}

#[test]
fn test_blocking_reads_follow_ramp() {
    let device = fast_ramp_device();
    let file = device.open(OpenFlags::default());

    let mut buf = [0u8; RECORD_SIZE];
    let temps: Vec<i32> = (0..5)
        .map(|_| {
            assert_eq!(file.read(&mut buf).unwrap(), RECORD_SIZE);
            record::decode(&buf).unwrap().temperature_mc
        })
        .collect();
    assert_eq!(temps, vec![26_000, 27_000, 28_000, 29_000, 30_000]);
}

#[test]
fn test_attributes_and_commands_agree() {
    let device = SimTempDevice::probe(InitialConfig::default().with_sampling_ms(10_000)).unwrap();
    let file = device.open(OpenFlags::NONBLOCK);
    let attrs = device.attributes();

    attrs.store("sampling_ms", "200\n").unwrap();
    let mut arg = 10_000u32.to_le_bytes();
    file.ioctl(SIMTEMP_SET_SAMPLING, &mut arg).unwrap();
    assert_eq!(attrs.show("sampling_ms").unwrap().as_str(), "10000\n");

    file.command(Command::SetThreshold(30_500)).unwrap();
    assert_eq!(attrs.show("threshold_mC").unwrap().as_str(), "30500\n");

    file.command(Command::SetMode(2)).unwrap();
    assert_eq!(attrs.show("mode").unwrap().as_str(), "ramp\n");

    for _ in 0..3 {
        device.engine().tick();
    }

    let mut stats = [0u8; 16];
    file.ioctl(SIMTEMP_GET_STATS, &mut stats).unwrap();
    let reply = file.command(Command::GetStats).unwrap().unwrap();
    assert_eq!(&stats, &reply.to_bytes());
    assert_eq!(
        attrs.show("stats").unwrap().as_str(),
        format!(
            "samples_produced: {}\nalerts_triggered: {}\nqueue_overflow_errors: 0\nlast_error: 0\n",
            reply.samples_produced, reply.alerts_triggered
        )
    );
    assert_eq!(reply.samples_produced, 3);
}

#[test]
fn test_rejected_command_changes_nothing() {
    let device = fast_ramp_device();
    let file = device.open(OpenFlags::NONBLOCK);
    let before = device.engine().config();

    assert!(file.command(Command::SetSampling(10_001)).is_err());
    assert!(file.command(Command::SetMode(7)).is_err());
    assert!(device.attributes().store("mode", "hot").is_err());
    assert_eq!(device.engine().config(), before);
}

#[test]
fn test_priority_poller_sees_alert() {
    let device = fast_ramp_device();
    let file = device.open(OpenFlags::NONBLOCK);
    // Ramp passes 31000 after a few ticks
    device.attributes().store("threshold_mC", "30000").unwrap();

    let started = Instant::now();
    let ready = file
        .poll_wait(PollMask::POLLPRI, Some(Duration::from_secs(5)))
        .unwrap();
    assert!(ready.contains(PollMask::POLLPRI));
    assert!(started.elapsed() < Duration::from_secs(5));

    let mut saw_alert = false;
    let mut buf = [0u8; RECORD_SIZE];
    while file.read(&mut buf).is_ok() {
        saw_alert |= record::decode(&buf).unwrap().flags.contains(SampleFlags::THRESHOLD_CROSSED);
    }
    assert!(saw_alert);
}

#[test]
fn test_interrupt_blocked_read() {
    let device = SimTempDevice::probe(InitialConfig::default().with_sampling_ms(10_000)).unwrap();
    let file = device.open(OpenFlags::default());
    let interrupter = file.interrupter();

    let handle = std::thread::spawn(move || {
        let mut buf = [0u8; RECORD_SIZE];
        file.read(&mut buf)
    });
    std::thread::sleep(Duration::from_millis(20));
    interrupter.interrupt();

    let result = handle.join().unwrap();
    assert!(matches!(result, Err(DeviceError::Engine(SimTempError::Interrupted))));
}

#[tokio::test]
async fn test_async_reader() {
    let device = fast_ramp_device();
    let mut reader = AsyncDeviceReader::open(&device);

    let first = reader.next_sample().await.unwrap();
    let second = reader.next_sample().await.unwrap();
    assert_eq!(first.temperature_mc, 26_000);
    assert_eq!(second.temperature_mc, 27_000);
    assert!(second.timestamp_ns > first.timestamp_ns);
}

#[tokio::test]
async fn test_async_reader_timeout_and_drop() {
    let device = SimTempDevice::probe(InitialConfig::default().with_sampling_ms(10_000)).unwrap();
    let mut reader = AsyncDeviceReader::open(&device);
    assert!(reader.readiness().is_empty());

    let waited = tokio::time::timeout(Duration::from_millis(50), reader.next_sample()).await;
    assert!(waited.is_err());

    // Interrupts the read left on the blocking pool
    drop(reader);
    device.remove();
}

#[tokio::test]
async fn test_async_reader_keeps_sample_after_timeout() {
    let engine = Engine::builder()
        .initial(InitialConfig::default().with_sampling_ms(10_000))
        .mode(Mode::Ramp)
        .build()
        .unwrap();
    let device = SimTempDevice::with_engine(engine).unwrap();
    let mut reader = AsyncDeviceReader::open(&device);

    let waited = tokio::time::timeout(Duration::from_millis(50), reader.next_sample()).await;
    assert!(waited.is_err());

    device.engine().tick();
    device.engine().tick();

    let first = reader.next_sample().await.unwrap();
    let second = reader.next_sample().await.unwrap();
    assert_eq!(first.temperature_mc, 26_000);
    assert_eq!(second.temperature_mc, 27_000);
    assert_eq!(device.engine().queue_len(), 0);
}
