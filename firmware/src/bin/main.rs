#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{BufferedUart, Config as UartConfig, Uart};
use embassy_rp::watchdog::Watchdog;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};
use radar_firmware::{
    CommandOutcome, ControlCommand, ControlInput, ControlInputError, ControlOutput,
    EmbassyClock, HealthAction, IoUart, PublishGate, Radar, RadarConfig, SmoothingConfig,
    TargetReport, WatchdogPump,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART0_IRQ => embassy_rp::uart::InterruptHandler<UART0>;
    UART1_IRQ => embassy_rp::uart::BufferedInterruptHandler<UART1>;
});

type RadarLink = Radar<IoUart<BufferedUart>, EmbassyClock, WatchdogPump>;

/// Pause between radar polls.
const POLL_INTERVAL_MS: u64 = 2;

/// Period of the status log.
const STATUS_INTERVAL_MS: u64 = 10_000;

/// Signal for passing target reports from the radar task to the report task.
/// Only the most recent report matters, so a Signal is enough.
static REPORT_SIGNAL: StaticCell<Signal<CriticalSectionRawMutex, TargetReport>> =
    StaticCell::new();

/// Parsed control commands waiting for the radar task.
static COMMANDS: Channel<CriticalSectionRawMutex, ControlCommand, 4> = Channel::new();

/// Replies waiting to be written to the control port.
static REPLIES: Channel<CriticalSectionRawMutex, CommandOutcome, 4> = Channel::new();

/// Radar UART ring buffers.
static RADAR_TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RADAR_RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Radar tracker starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let signal = REPORT_SIGNAL.init(Signal::new());
    let radar_config = RadarConfig::default();

    // --- Radar UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = radar_config.baud;

    let radar_uart = BufferedUart::new(
        p.UART1,
        p.PIN_4, // TX
        p.PIN_5, // RX
        Irqs,
        RADAR_TX_BUF.init([0; 64]),
        RADAR_RX_BUF.init([0; 512]),
        uart_config,
    );
    let port = IoUart::new(radar_uart, radar_config.baud);

    // --- Control UART Setup ---
    let mut control_config = UartConfig::default();
    control_config.baudrate = 115_200;

    let control_uart = Uart::new(
        p.UART0,
        p.PIN_0, // TX
        p.PIN_1, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        control_config,
    );
    let (tx, rx) = control_uart.split();

    // --- Radar Setup ---
    let pump = WatchdogPump::start(Watchdog::new(p.WATCHDOG));
    let radar = Radar::new(
        port,
        EmbassyClock,
        pump,
        radar_config,
        SmoothingConfig::default(),
    );

    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(radar_task(radar, signal).unwrap());
    spawner.spawn(control_task(ControlInput::new(rx)).unwrap());
    spawner.spawn(reply_task(ControlOutput::new(tx)).unwrap());
    spawner.spawn(report_task(signal, led).unwrap());

    info!("Radar tracker initialized, waiting for data...");
}

/// Radar task - owns the sensor link and runs everything that touches it.
#[embassy_executor::task]
async fn radar_task(
    mut radar: RadarLink,
    signal: &'static Signal<CriticalSectionRawMutex, TargetReport>,
) {
    let settle = u64::from(radar.channel().config().serial_settle_ms);
    Timer::after_millis(settle).await;

    let (range, hold) = radar.configure();
    info!("startup range: {}", range.as_str());
    info!("startup hold: {}", hold.as_str());

    let mut gate = PublishGate::default();
    let mut last_status = Instant::now();

    loop {
        if let Some(snapshot) = radar.poll() {
            let report = TargetReport::from_snapshot(&snapshot);
            if gate.should_publish(&report, Instant::now().as_millis()) {
                signal.signal(report);
            }
        }

        if let Ok(command) = COMMANDS.try_receive() {
            let outcome = radar.execute(command);
            match command {
                ControlCommand::Reboot => {
                    REPLIES.send(outcome).await;
                    Timer::after_millis(100).await;
                    radar.channel_mut().pump_mut().reboot();
                }
                ControlCommand::GetStatus => {
                    info!("status: {}", radar.telemetry());
                }
                ControlCommand::Config => {
                    warn!("no configuration portal on this board");
                }
                _ => {}
            }
            REPLIES.send(outcome).await;
        }

        match radar.check_connection() {
            HealthAction::Reboot => {
                error!("radar unresponsive, rebooting");
                Timer::after_millis(100).await;
                radar.channel_mut().pump_mut().reboot();
            }
            HealthAction::RestartSerial | HealthAction::None => {}
        }

        if last_status.elapsed().as_millis() >= STATUS_INTERVAL_MS {
            last_status = Instant::now();
            let telemetry = radar.telemetry();
            info!("status: {}", telemetry);
            for warning in telemetry.warnings() {
                warn!("{}", warning.as_str());
            }
        }

        radar.channel_mut().pump_mut().feed();
        Timer::after_millis(POLL_INTERVAL_MS).await;
    }
}

/// Control task - reads command lines and hands them to the radar task.
#[embassy_executor::task]
async fn control_task(mut input: ControlInput<'static>) {
    loop {
        match input.receive().await {
            Ok(command) => {
                info!("control command: {}", command);
                COMMANDS.send(command).await;
            }
            Err(ControlInputError::Command(e)) => {
                warn!("control command rejected: {}", e);
                REPLIES
                    .send(CommandOutcome::new(false, format_args!("{}", e)))
                    .await;
            }
            Err(ControlInputError::Uart(e)) => {
                error!("control uart error: {}", e);
            }
        }
    }
}

/// Reply task - writes command outcomes back to the control port.
#[embassy_executor::task]
async fn reply_task(mut output: ControlOutput<'static>) {
    loop {
        let outcome = REPLIES.receive().await;
        if let Err(e) = output.send_line(outcome.as_str()).await {
            error!("reply not sent: {}", e);
        }
    }
}

/// Report task - waits for target reports and publishes them.
#[embassy_executor::task]
async fn report_task(
    signal: &'static Signal<CriticalSectionRawMutex, TargetReport>,
    mut led: Output<'static>,
) {
    loop {
        let report = signal.wait().await;
        info!("targets: {}", report);
        led.toggle();
    }
}
