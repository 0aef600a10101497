//! Borrows arrays from a pool and prints its statistics before and after returning them.

use buffer_pool::BufferPool;

fn main() {
    let pool = BufferPool::<i32>::new("TestPool", 5);

    // Borrow eight arrays of three elements without returning any.
    let held: Vec<_> = (0..8)
        .map(|i| {
            let mut buffer = pool.get(3).unwrap();
            buffer[2] = i;
            buffer
        })
        .collect();

    println!("{}", pool.stats());

    // Dropping the handles returns every array to the pool.
    drop(held);

    println!("{}", pool.stats());
}
