use embassy_futures::select::{Either, select};
use embassy_stm32::usart::BufferedUartTx;
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;
use heapless::String;

use super::{FirmwareController, RxQueue};

/// Tick used to advance an in-flight alert between received bytes.
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Room for one echo plus one response.
const TX_LINE_CAPACITY: usize = 160;

/// Single consumer of received bytes: dispatches commands and advances alerts.
#[embassy_executor::task]
pub async fn run(
    mut controller: FirmwareController,
    mut uart_tx: BufferedUartTx<'static>,
    queue: &'static RxQueue,
) -> ! {
    let receiver = queue.receiver();
    let mut outbound: String<TX_LINE_CAPACITY> = String::new();

    if controller.start(&mut outbound).is_err() {
        defmt::warn!("alert: startup banner truncated");
    }
    transmit(&mut uart_tx, &mut outbound).await;

    loop {
        if let Either::First(chunk) = select(receiver.receive(), Timer::after(POLL_INTERVAL)).await {
            // One byte at a time keeps each flush to at most one echo and response.
            for byte in &chunk {
                if controller
                    .feed(core::slice::from_ref(byte), &mut outbound)
                    .is_err()
                {
                    defmt::warn!("alert: response truncated");
                }
                if !outbound.is_empty() {
                    transmit(&mut uart_tx, &mut outbound).await;
                }
            }
        }
        controller.poll();
    }
}

async fn transmit(uart_tx: &mut BufferedUartTx<'static>, outbound: &mut String<TX_LINE_CAPACITY>) {
    if uart_tx.write_all(outbound.as_bytes()).await.is_err() {
        defmt::warn!("alert: UART write error");
        Timer::after(Duration::from_millis(5)).await;
    } else if uart_tx.flush().await.is_err() {
        defmt::warn!("alert: UART flush error");
    }
    outbound.clear();
}
