#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_nrf::{
    bind_interrupts,
    buffered_uarte::{self, BufferedUarte},
    gpio::{Input, Level, Output, OutputDrive, Pull},
    interrupt, peripherals,
    twim::{self, Twim},
    uarte,
};
use embassy_nrf::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use lux_core::{
    config,
    error::FatalError,
    reporting,
    sample::SampleSlot,
    sampling,
    sensor::opt3001::Opt3001,
    serial::{Parity, SerialSettings},
    toggle,
};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    UARTE0 => buffered_uarte::InterruptHandler<peripherals::UARTE0>;
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

static SAMPLE: SampleSlot<CriticalSectionRawMutex> = SampleSlot::new();

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

static TWIM_BUFFER: StaticCell<[u8; 16]> = StaticCell::new();
static UART_RX_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();
static UART_TX_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();

#[interrupt]
unsafe fn EGU1_SWI1() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[embassy_executor::task]
async fn sampling_task(runner: sampling::Runner<'static, CriticalSectionRawMutex, Opt3001<Twim<'static>>>) {
    match runner.run().await {
        Ok(never) => match never {},
        Err(e) => fatal(e),
    }
}

#[embassy_executor::task]
async fn reporting_task(runner: reporting::Runner<'static, CriticalSectionRawMutex, BufferedUarte<'static>>) {
    runner.run().await
}

#[embassy_executor::task]
async fn toggle_task(runner: toggle::Runner<Input<'static>, Output<'static>>) {
    runner.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    match start(spawner) {
        Ok(()) => info!("lux-monitor running"),
        Err(e) => fatal(e),
    }
}

fn start(spawner: Spawner) -> Result<(), FatalError> {
    let p = embassy_nrf::init(Default::default());

    let led = Output::new(p.P0_13, Level::Low, OutputDrive::Standard);
    let button = Input::new(p.P0_11, Pull::Up);

    let mut twim_config = twim::Config::default();
    twim_config.frequency = bus_frequency(config::SENSOR_BUS_HZ)?;
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim_config, TWIM_BUFFER.init([0; 16]));

    let uart = BufferedUarte::new(
        p.UARTE0,
        p.TIMER0,
        p.PPI_CH0,
        p.PPI_CH1,
        p.PPI_GROUP0,
        p.P0_08,
        p.P0_06,
        Irqs,
        uarte_config(&SerialSettings::REPORTER)?,
        UART_RX_BUFFER.init([0; 64]),
        UART_TX_BUFFER.init([0; 256]),
    );

    // toggle preempts both loops
    interrupt::EGU1_SWI1.set_priority(Priority::P6);
    let high_prio_spawner = EXECUTOR_HIGH.start(interrupt::EGU1_SWI1);
    high_prio_spawner
        .spawn(toggle_task(toggle::new(button, led)))
        .map_err(|_| FatalError::TaskSpawn)?;

    spawner
        .spawn(sampling_task(sampling::new(&SAMPLE, Opt3001::new(i2c))))
        .map_err(|_| FatalError::TaskSpawn)?;
    spawner
        .spawn(reporting_task(reporting::new(&SAMPLE, uart)))
        .map_err(|_| FatalError::TaskSpawn)?;

    Ok(())
}

fn bus_frequency(hz: u32) -> Result<twim::Frequency, FatalError> {
    match hz {
        100_000 => Ok(twim::Frequency::K100),
        250_000 => Ok(twim::Frequency::K250),
        400_000 => Ok(twim::Frequency::K400),
        _ => Err(FatalError::BusConfig { hz }),
    }
}

fn uarte_config(settings: &SerialSettings) -> Result<uarte::Config, FatalError> {
    let mut config = uarte::Config::default();
    config.baudrate = match settings.baudrate {
        9600 => uarte::Baudrate::BAUD9600,
        19200 => uarte::Baudrate::BAUD19200,
        115200 => uarte::Baudrate::BAUD115200,
        _ => return Err(FatalError::SerialConfig),
    };
    config.parity = match settings.parity {
        Parity::None => uarte::Parity::EXCLUDED,
        Parity::Even => uarte::Parity::INCLUDED,
    };
    // UARTE has no local echo
    if settings.echo {
        return Err(FatalError::SerialConfig);
    }
    debug!("UART> {:?}", settings);
    Ok(config)
}

fn fatal(error: FatalError) -> ! {
    error!("Fatal> {:?}", error);
    defmt::panic!("fatal configuration error: {:?}", error)
}
