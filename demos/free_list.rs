use freelist_pool::{FreeListAllocator, PoolStats};
use tracing_subscriber::EnvFilter;

/// Element type for the walkthrough: one 16-byte slot per element.
type Slot = [u64; 2];

/// Prints every block in address order, then the free list in list order.
fn print_heap(
  label: &str,
  pool: &FreeListAllocator<Slot>,
) {
  println!("\n[{label}]");

  for block in pool.blocks() {
    println!(
      "  {:>6} .. {:>6}  {:>5} bytes  left_size = {:>5}  {}",
      block.offset,
      block.offset + block.size,
      block.size,
      block.left_size,
      if block.allocated { "ALLOCATED" } else { "free" },
    );
  }

  let order: Vec<_> = pool.free_list().map(|block| block.offset).collect();
  println!("  free list: {order:?}");

  let PoolStats {
    free_bytes,
    largest_free,
    ..
  } = pool.stats();
  println!("  free bytes = {free_bytes}, largest free block = {largest_free}");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  // RUST_LOG=freelist_pool=trace shows every list walk and split.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  // Room for 8 single-slot blocks. Larger requests take several slots plus
  // one header each.
  let mut pool = FreeListAllocator::<Slot>::new(8)?;
  println!(
    "capacity = {} bytes, header = {} bytes",
    pool.capacity(),
    pool.header_size()
  );
  print_heap("start: one free block", &pool);

  // --------------------------------------------------------------------
  // 1) Three allocations. The first two split the free block from the
  //    front; the third takes what is left in one piece.
  // --------------------------------------------------------------------
  let a = pool.allocate(3)?;
  let b = pool.allocate(2)?;
  let rest = (pool.stats().largest_free - pool.header_size()) / size_of::<Slot>();
  let c = pool.allocate(rest)?;
  print_heap("1) allocate A(3), B(2), C(rest)", &pool);

  unsafe {
    a.as_ptr().write([0xA, 0xA]);
    b.as_ptr().write([0xB, 0xB]);
    c.as_ptr().write([0xC, 0xC]);
  }

  // --------------------------------------------------------------------
  // 2) Free B: both neighbours are allocated, so nothing merges.
  // --------------------------------------------------------------------
  unsafe { pool.deallocate(b.as_ptr(), 2) };
  print_heap("2) free B (no merge)", &pool);

  // --------------------------------------------------------------------
  // 3) Free A: its right neighbour B is free and gets absorbed.
  // --------------------------------------------------------------------
  unsafe { pool.deallocate(a.as_ptr(), 3) };
  print_heap("3) free A (merges right with B)", &pool);

  // --------------------------------------------------------------------
  // 4) A request one slot bigger than the A+B hole fails. Nothing is
  //    compacted and the heap is left untouched.
  // --------------------------------------------------------------------
  let too_big = (pool.stats().largest_free - pool.header_size()) / size_of::<Slot>() + 1;
  match pool.allocate(too_big) {
    Ok(_) => println!("\n[4] unexpected success"),
    Err(err) => println!("\n[4] allocate({too_big}) failed: {err}"),
  }

  // --------------------------------------------------------------------
  // 5) Free C: merges left into A+B, leaving a single free block again.
  // --------------------------------------------------------------------
  unsafe { pool.deallocate(c.as_ptr(), rest) };
  print_heap("5) free C (merges left)", &pool);

  pool.validate()?;
  println!("\n[6] End of example. The arena is unmapped when the pool drops.");

  Ok(())
}
