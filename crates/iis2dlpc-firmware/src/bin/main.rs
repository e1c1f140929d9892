#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::Io;
use esp_hal::handler;
use esp_hal::i2c::master::I2c;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::WifiController;
use log::{error, info, warn};
use static_cell::StaticCell;

use iis2dlpc_core::registers::{CTRL1, CTRL1_ODR_50HZ_LP1, DEVICE_ID};
use iis2dlpc_core::{
    DefaultDeferred, I2cInterface, Iis2dlpc, InterruptBridge, RegisterInterface, TriggerHandler,
    TriggerKind,
};
use iis2dlpc_firmware::board::{
    ACCEL_I2C_ADDR, ACCEL_INT_GPIO, ACCEL_INTERRUPT, accel_interrupt_pin, create_i2c_bus,
};
use iis2dlpc_firmware::interrupt_pin::EspInterruptPin;
use iis2dlpc_firmware::wifi::start_station;
use iis2dlpc_firmware::wifi_secrets::station_config;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

type AccelBridge = InterruptBridge<EspInterruptPin<'static>, DefaultDeferred>;
type AccelBus = I2cInterface<I2c<'static, esp_hal::Async>>;

#[cfg(feature = "trigger-global-thread")]
static WORK_QUEUE: iis2dlpc_core::WorkQueue = iis2dlpc_core::WorkQueue::new();

#[cfg(feature = "trigger-global-thread")]
static ACCEL_BRIDGE: AccelBridge = InterruptBridge::new(iis2dlpc_core::WorkItem::new(
    &WORK_QUEUE,
    iis2dlpc_firmware::board::ACCEL_WORK_ID,
));

#[cfg(not(feature = "trigger-global-thread"))]
static ACCEL_BRIDGE: AccelBridge = InterruptBridge::new(iis2dlpc_core::EdgeSignal::new());

/// Trigger callbacks only forward the kind; the logger task does the rest
static TRIGGER_EVENTS: Channel<CriticalSectionRawMutex, TriggerKind, 8> = Channel::new();

fn forward_trigger(kind: TriggerKind) {
    if TRIGGER_EVENTS.try_send(kind).is_err() {
        warn!("Trigger event queue full, dropping {}", kind.name());
    }
}

#[handler]
fn gpio_interrupt() {
    let pending = ACCEL_BRIDGE
        .with_pin(|pin| pin.take_pending())
        .unwrap_or(false);
    if pending {
        ACCEL_BRIDGE.on_edge(1 << ACCEL_INT_GPIO);
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    // Wi-Fi
    static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    match esp_radio::init() {
        Ok(radio) => {
            let radio = RADIO.init(radio);
            match esp_radio::wifi::new(radio, peripherals.WIFI, Default::default()) {
                Ok((controller, _interfaces)) => {
                    spawner.spawn(wifi_task(controller).unwrap());
                }
                Err(e) => error!("WiFi Init Failed: {:?}", e),
            }
        }
        Err(e) => error!("WiFi Init Failed: {:?}", e),
    }

    // Accelerometer
    let mut io = Io::new(peripherals.IO_MUX);
    io.set_interrupt_handler(gpio_interrupt);

    let i2c0 = create_i2c_bus(peripherals.I2C0, peripherals.GPIO12, peripherals.GPIO11)
        .expect("Failed to configure I2C0");
    let int_pin = accel_interrupt_pin(peripherals.GPIO14);

    spawner.spawn(accel_task(I2cInterface::new(i2c0, ACCEL_I2C_ADDR), int_pin).unwrap());
    spawner.spawn(trigger_logger_task().unwrap());

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}

#[embassy_executor::task]
async fn wifi_task(mut controller: WifiController<'static>) {
    let config = station_config();
    if let Err(e) = start_station(&mut controller, &config).await {
        error!("WiFi Init Failed: {}", e);
    }
}

/// Bring up the accelerometer and run its dispatch loop.
#[embassy_executor::task]
async fn accel_task(bus: AccelBus, int_pin: EspInterruptPin<'static>) {
    let mut accel = Iis2dlpc::new(bus, &ACCEL_BRIDGE);

    match accel.device_id().await {
        Ok(DEVICE_ID) => info!("IIS2DLPC found"),
        Ok(other) => {
            error!("Unexpected IIS2DLPC WHO_AM_I: {:#04x}", other);
            return;
        }
        Err(e) => {
            error!("IIS2DLPC not responding: {}", e);
            return;
        }
    }

    if let Err(e) = accel.init_interrupts(&ACCEL_INTERRUPT, int_pin).await {
        error!("IIS2DLPC interrupt setup failed: {}", e);
        return;
    }

    if let Err(e) = accel
        .interface_mut()
        .write_register(CTRL1, CTRL1_ODR_50HZ_LP1)
        .await
    {
        error!("IIS2DLPC power-up failed: {:?}", e);
        return;
    }

    let handler: TriggerHandler<'static> = &forward_trigger;
    for kind in [TriggerKind::DataReady, TriggerKind::Tap, TriggerKind::DoubleTap] {
        match accel.set_trigger(kind, Some(handler)).await {
            Ok(()) => info!("Trigger {} enabled", kind.name()),
            Err(e) => warn!("Trigger {} not enabled: {}", kind.name(), e),
        }
    }

    #[cfg(not(feature = "trigger-global-thread"))]
    accel.run().await;

    #[cfg(feature = "trigger-global-thread")]
    WORK_QUEUE
        .run(async |id| {
            if id == iis2dlpc_firmware::board::ACCEL_WORK_ID {
                accel.handle_interrupt().await;
            }
        })
        .await;
}

/// Log trigger events, sampling the count of data-ready events
#[embassy_executor::task]
async fn trigger_logger_task() {
    let mut samples: u32 = 0;
    loop {
        match TRIGGER_EVENTS.receive().await {
            TriggerKind::DataReady => {
                samples = samples.wrapping_add(1);
                if samples % 50 == 0 {
                    info!("{} data-ready events", samples);
                }
            }
            kind => info!("Trigger: {}", kind.name()),
        }
    }
}
