//! Desktop simulator for the IIS2DLPC trigger driver.
//!
//! Runs the driver against [`SensorModel`], a register-level model of the
//! accelerometer stepped by a separate "hardware" thread that plays the role
//! of the GPIO interrupt. Two scenarios are exercised:
//!
//! | Scenario    | Deferred dispatch                                    |
//! |-------------|------------------------------------------------------|
//! | own thread  | one device, [`EdgeSignal`] awaited by its own loop   |
//! | work queue  | two devices sharing a [`WorkQueue`] and one worker   |
//!
//! Set `RUST_LOG=info` (or `debug`) to see the dispatch log.

mod sensor_model;
mod sim_pin;

use std::cell::Cell;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use embassy_futures::block_on;
use iis2dlpc_core::registers::{CTRL1, CTRL1_ODR_50HZ_LP1, DEVICE_ID};
use iis2dlpc_core::{
    DeferredDispatch, EdgeSignal, Iis2dlpc, InterruptBridge, InterruptConfig, InterruptPad,
    RegisterInterface, TriggerKind, WorkItem, WorkQueue,
};
use log::{error, info, warn};

use sensor_model::{SensorModel, SimBus};
use sim_pin::SimPin;

/// Simulated sample period (50 Hz)
const SAMPLE_PERIOD: Duration = Duration::from_millis(20);

/// Dispatch cycles to run per scenario
const DISPATCH_CYCLES: usize = 120;

// ---------------------------------------------------------------------------
// Shared bring-up
// ---------------------------------------------------------------------------

/// Probe the device, bind its interrupt, power it up and enable triggers.
async fn bring_up<'a, D: DeferredDispatch>(
    accel: &mut Iis2dlpc<'a, SimBus<'a>, SimPin<'a>, D>,
    config: &InterruptConfig,
    pin: SimPin<'a>,
    handler: &'a dyn Fn(TriggerKind),
) -> bool {
    match accel.device_id().await {
        Ok(DEVICE_ID) => {}
        Ok(other) => {
            error!("Unexpected WHO_AM_I {:#04x}", other);
            return false;
        }
        Err(e) => {
            error!("Device not responding: {}", e);
            return false;
        }
    }

    if let Err(e) = accel.init_interrupts(config, pin).await {
        error!("Interrupt setup failed: {}", e);
        return false;
    }

    // SimBus cannot fail
    let _ = accel
        .interface_mut()
        .write_register(CTRL1, CTRL1_ODR_50HZ_LP1)
        .await;

    for kind in [
        TriggerKind::DataReady,
        TriggerKind::Tap,
        TriggerKind::DoubleTap,
        TriggerKind::Threshold,
    ] {
        match accel.set_trigger(kind, Some(handler)).await {
            Ok(()) => info!("{:?}: {} enabled", config.pad, kind.name()),
            Err(e) => warn!("{:?}: {} rejected: {}", config.pad, kind.name(), e),
        }
    }
    true
}

/// Step `model` at the sample rate, raising an edge on `bridge` for every
/// pulse on `pad` while the pin listens, until `stop` is set.
fn drive_hardware<D: DeferredDispatch>(
    model: &Mutex<SensorModel>,
    pad: InterruptPad,
    gpio_pin: u8,
    listening: &AtomicBool,
    bridge: &InterruptBridge<SimPin<'_>, D>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::SeqCst) {
        thread::sleep(SAMPLE_PERIOD);
        let pulse = model.lock().unwrap_or_else(|e| e.into_inner()).step();
        let fired = match pad {
            InterruptPad::Int1 => pulse.int1,
            InterruptPad::Int2 => pulse.int2,
        };
        if fired && listening.load(Ordering::SeqCst) {
            bridge.on_edge(1 << gpio_pin);
        }
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// One device on INT1 with its own dispatch loop.
fn run_own_thread() {
    info!("Own-thread scenario: INT1 on GPIO 4");

    let config = InterruptConfig::new(InterruptPad::Int1, 4);
    let model = Mutex::new(SensorModel::new());
    let listening = AtomicBool::new(false);
    let stop = AtomicBool::new(false);
    let bridge = InterruptBridge::new(EdgeSignal::new());

    let data_ready = Cell::new(0u32);
    let taps = Cell::new(0u32);
    let double_taps = Cell::new(0u32);
    let handler = |kind: TriggerKind| match kind {
        TriggerKind::DataReady => data_ready.set(data_ready.get() + 1),
        TriggerKind::Tap => taps.set(taps.get() + 1),
        TriggerKind::DoubleTap => double_taps.set(double_taps.get() + 1),
        _ => {}
    };

    let mut accel = Iis2dlpc::new(SimBus::new(&model), &bridge);
    if !block_on(bring_up(&mut accel, &config, SimPin::new(&listening), &handler)) {
        return;
    }

    thread::scope(|s| {
        s.spawn(|| drive_hardware(&model, config.pad, config.gpio_pin, &listening, &bridge, &stop));

        for _ in 0..DISPATCH_CYCLES {
            let report = block_on(accel.dispatch_next());
            if report.fired().contains(&TriggerKind::DataReady) {
                match block_on(accel.acceleration_raw()) {
                    Ok([x, y, z]) => log::debug!("Sample x={} y={} z={}", x, y, z),
                    Err(e) => warn!("Sample read failed: {}", e),
                }
            }
            if report.fired().len() > 1 {
                info!("Fired {:?}", report.fired());
            }
        }

        stop.store(true, Ordering::SeqCst);
    });

    info!(
        "Own-thread scenario done: {} data-ready, {} tap, {} double tap",
        data_ready.get(),
        taps.get(),
        double_taps.get()
    );
}

/// Two devices, INT1 and INT2, drained by a single worker.
fn run_work_queue() {
    const FIRST: u8 = 0;
    const SECOND: u8 = 1;

    info!("Work-queue scenario: INT1 on GPIO 4, INT2 on GPIO 5");

    let queue = WorkQueue::new();
    let configs = [
        InterruptConfig::new(InterruptPad::Int1, 4),
        InterruptConfig::new(InterruptPad::Int2, 5),
    ];
    let models = [
        Mutex::new(SensorModel::new()),
        Mutex::new(SensorModel::new()),
    ];
    let listening = [AtomicBool::new(false), AtomicBool::new(false)];
    let stop = AtomicBool::new(false);
    let bridges = [
        InterruptBridge::new(WorkItem::new(&queue, FIRST)),
        InterruptBridge::new(WorkItem::new(&queue, SECOND)),
    ];

    let counts = [Cell::new(0u32), Cell::new(0u32)];
    let first_handler = |_: TriggerKind| counts[0].set(counts[0].get() + 1);
    let second_handler = |_: TriggerKind| counts[1].set(counts[1].get() + 1);

    let mut first = Iis2dlpc::new(SimBus::new(&models[0]), &bridges[0]);
    let mut second = Iis2dlpc::new(SimBus::new(&models[1]), &bridges[1]);
    let ready = block_on(bring_up(
        &mut first,
        &configs[0],
        SimPin::new(&listening[0]),
        &first_handler,
    )) && block_on(bring_up(
        &mut second,
        &configs[1],
        SimPin::new(&listening[1]),
        &second_handler,
    ));
    if !ready {
        return;
    }

    thread::scope(|s| {
        for i in 0..2 {
            let (model, config, listening, bridge, stop) =
                (&models[i], &configs[i], &listening[i], &bridges[i], &stop);
            s.spawn(move || {
                drive_hardware(model, config.pad, config.gpio_pin, listening, bridge, stop)
            });
        }

        for _ in 0..DISPATCH_CYCLES {
            let report = match block_on(queue.next()) {
                FIRST => block_on(first.handle_interrupt()),
                SECOND => block_on(second.handle_interrupt()),
                other => {
                    warn!("Unknown work item {}", other);
                    continue;
                }
            };
            log::debug!("Fired {:?}", report.fired());
        }

        stop.store(true, Ordering::SeqCst);
    });

    info!(
        "Work-queue scenario done: {} events on INT1 device, {} on INT2 device",
        counts[0].get(),
        counts[1].get()
    );
}

fn main() {
    env_logger::init();
    info!("Starting IIS2DLPC simulator");

    run_own_thread();
    run_work_queue();
}
