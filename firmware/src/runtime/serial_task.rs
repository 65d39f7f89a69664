use embassy_stm32::usart::BufferedUartRx;
use embassy_time::{Duration, Timer};
use embedded_io_async::Read;

use super::{RX_CHUNK_SIZE, RxChunk, RxQueue};

/// Reads the UART and forwards raw chunks; framing happens in the controller.
#[embassy_executor::task]
pub async fn run(mut uart_rx: BufferedUartRx<'static>, queue: &'static RxQueue) -> ! {
    let sender = queue.sender();
    let mut ingress = [0u8; RX_CHUNK_SIZE];
    loop {
        match uart_rx.read(&mut ingress).await {
            Ok(count) if count > 0 => {
                let mut chunk = RxChunk::new();
                // `count` never exceeds the chunk capacity.
                let _ = chunk.extend_from_slice(&ingress[..count]);
                sender.send(chunk).await;
            }
            Ok(_) => {}
            Err(_) => {
                defmt::warn!("serial: UART read error");
                Timer::after(Duration::from_millis(5)).await;
            }
        }
    }
}
