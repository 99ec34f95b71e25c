//! Demonstrates basic usage of `GrowableArray`.
//!
//! This example shows how the capacity grows as elements are appended, how positional
//! insertion and removal work and how failures are reported without modifying the array.

use growable_array::{Error, GrowableArray};

fn main() -> Result<(), Error> {
    println!("=== GrowableArray Basic Example ===");
    println!();

    let mut array = GrowableArray::new();

    println!("Appending 10 elements:");

    for value in 0..10_u32 {
        array.push_back(value)?;
        println!("  len = {:2}, capacity = {:2}", array.len(), array.capacity());
    }

    println!();

    array.insert(0, 100)?;
    array.erase_range(5..8)?;
    println!("After inserting at the front and erasing three elements: {array:?}");

    array.shrink_to_fit();
    println!("After shrink_to_fit: capacity = {}", array.capacity());

    println!();

    match array.insert(array.len() + 1, 0) {
        Ok(_) => println!("Unexpectedly inserted past the end"),
        Err(error) => println!("Inserting past the end failed: {error}"),
    }

    match array.reserve(usize::MAX) {
        Ok(()) => println!("Unexpectedly reserved usize::MAX elements"),
        Err(error) => println!("Reserving usize::MAX elements failed: {error}"),
    }

    println!("The array is unchanged: {array:?}");

    Ok(())
}
