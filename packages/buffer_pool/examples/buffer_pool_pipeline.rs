//! A producer/consumer pipeline that recycles sample blocks through a shared pool.
//!
//! The producer borrows a block per iteration, fills it and sends it to the consumer thread.
//! The consumer drops each block after use, which returns it to the pool. Only a handful of
//! blocks are ever manufactured no matter how many pass through the pipeline.

use std::sync::mpsc;
use std::thread;

use buffer_pool::{BufferPool, PooledBuffer};
use nm::Report;

const BLOCK_LENGTH: usize = 4096;
const BLOCK_COUNT: usize = 10_000;

fn main() {
    let pool = BufferPool::<f32>::builder()
        .name("sample_blocks")
        .refill_batch_size(8)
        .build();

    let (tx, rx) = mpsc::sync_channel::<PooledBuffer<f32>>(4);

    let consumer = thread::spawn(move || {
        let mut energy = 0.0_f64;

        for block in rx {
            energy += block.iter().map(|s| f64::from(*s * *s)).sum::<f64>();
        }

        energy
    });

    for index in 0..BLOCK_COUNT {
        let mut block = pool.get(BLOCK_LENGTH).unwrap();

        // Blocks come back with old samples in them; overwrite every element.
        #[expect(
            clippy::cast_precision_loss,
            reason = "sample values only need to be approximately right in an example"
        )]
        let level = (index % 100) as f32 / 100.0;
        block.fill(level);

        tx.send(block).unwrap();
    }

    drop(tx);
    let energy = consumer.join().unwrap();

    println!("Total energy: {energy:.1}");
    println!();
    println!("{}", pool.stats());
    println!("{}", Report::collect());
}
