use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Level, Output, OutputType, Speed};
use embassy_stm32::time::hz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use alert_core::config::ControllerConfig;
use alert_core::controller::Controller;
use alert_core::sequencer::IncrementalRunner;

use crate::hw::{HardwareActuator, LedBank};
use crate::time::FirmwareClock;

mod alert_task;
mod serial_task;

/// Bytes moved from the UART reader to the controller per message.
pub(super) const RX_CHUNK_SIZE: usize = 32;
const RX_QUEUE_DEPTH: usize = 4;
const UART_BUFFER_SIZE: usize = 256;

/// Carrier frequency the PWM timer is configured with before the first tone.
const BUZZER_IDLE_HZ: u32 = 2_000;

pub(super) type RxChunk = heapless::Vec<u8, RX_CHUNK_SIZE>;
pub(super) type RxQueue = Channel<CriticalSectionRawMutex, RxChunk, RX_QUEUE_DEPTH>;
pub(super) type FirmwareController =
    Controller<IncrementalRunner<HardwareActuator<'static>, FirmwareClock>>;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static RX_QUEUE: RxQueue = Channel::new();
static mut UART_TX_BUFFER: [u8; UART_BUFFER_SIZE] = [0; UART_BUFFER_SIZE];
static mut UART_RX_BUFFER: [u8; UART_BUFFER_SIZE] = [0; UART_BUFFER_SIZE];

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART2_LPUART2 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART2>;
});

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let hal::Peripherals {
        PA2,
        PA3,
        PA5,
        PA6,
        PB0,
        PB1,
        PB2,
        TIM3,
        USART2,
        ..
    } = hal::init(hal::Config::default());

    let leds = LedBank::new(
        Output::new(PB0, Level::Low, Speed::Low),
        Output::new(PB1, Level::Low, Speed::Low),
        Output::new(PB2, Level::Low, Speed::Low),
        Output::new(PA5, Level::Low, Speed::Low),
    );
    let buzzer = SimplePwm::new(
        TIM3,
        Some(PwmPin::new(PA6, OutputType::PushPull)),
        None,
        None,
        None,
        hz(BUZZER_IDLE_HZ),
        CountingMode::EdgeAlignedUp,
    );
    let actuator = HardwareActuator::new(buzzer, leds);

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = alert_core::config::BAUD_RATE;
    uart_config.data_bits = DataBits::DataBits8;
    uart_config.stop_bits = StopBits::STOP1;
    uart_config.parity = Parity::ParityNone;

    let uart = unsafe {
        BufferedUart::new(
            USART2,
            PA3,
            PA2,
            &mut UART_TX_BUFFER,
            &mut UART_RX_BUFFER,
            UartIrqs,
            uart_config,
        )
        .expect("failed to initialize serial UART")
    };
    let (uart_tx, uart_rx) = uart.split();

    let config = ControllerConfig::new();
    let runner = IncrementalRunner::new(actuator, config.profile, FirmwareClock);
    let controller = Controller::new(runner, &config);
    defmt::info!("alert controller booting, {} baud", alert_core::config::BAUD_RATE);

    spawner
        .spawn(serial_task::run(uart_rx, &RX_QUEUE))
        .expect("failed to spawn serial reader task");
    spawner
        .spawn(alert_task::run(controller, uart_tx, &RX_QUEUE))
        .expect("failed to spawn alert controller task");

    core::future::pending::<()>().await;
}
