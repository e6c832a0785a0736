use std::io::Read;
use std::sync::Arc;

use heapcore::config::AllocatorConfig;
use heapcore::{AllocationPolicy, Heap};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `htop`, or just visually track how allocations change between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_stats(label: &str, heap: &Heap) {
  let stats = heap.memory_usage_stats();
  println!(
    "[{label}] allocated={} ({} blocks), free={} ({} blocks), fragmentation={:.3}",
    stats.total_allocated,
    stats.allocated_blocks,
    stats.total_free,
    stats.free_blocks,
    heap.fragmentation_rate(),
  );
}

fn main() {
  // A heap with the real OS mapping provider and a fallback allocator
  // wired to the system `malloc`, for the rare reentrant call a demo
  // like this one could otherwise trigger (e.g. through stdio).
  let config = AllocatorConfig {
    fallback: Arc::new(|size| unsafe { libc::malloc(size) as *mut u8 }),
    ..AllocatorConfig::from_env()
  };
  let heap = Heap::with_os_provider(config);

  println!("heapcore policy walkthrough. PID = {}", std::process::id());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Allocate three blocks, free the middle one, watch it become a
  //    reusable free block rather than leaking until process exit.
  // --------------------------------------------------------------------
  println!("\n[1] Allocate three 256-byte blocks");
  let a = heap.allocate(256);
  let b = heap.allocate(256);
  let c = heap.allocate(256);
  print_stats("1", &heap);
  block_until_enter_pressed();

  println!("\n[2] Free the middle block");
  heap.free(b);
  print_stats("2", &heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Switch placement policy and show how the choice of candidate
  //    changes for the same free-list shape.
  // --------------------------------------------------------------------
  heap.free(a);
  heap.free(c);
  println!("\n[3] Three disjoint free blocks now on the list");
  print_stats("3", &heap);

  for policy in [AllocationPolicy::FirstFit, AllocationPolicy::BestFit, AllocationPolicy::WorstFit] {
    heap.reset_heap_for_testing();
    heap.set_policy(policy);
    let x = heap.allocate(64);
    let y = heap.allocate(512);
    let z = heap.allocate(128);
    heap.free(x);
    heap.free(y);
    heap.free(z);

    let chosen = heap.allocate(48);
    println!("[3] policy={policy:?} chose block at {:?} for a 48-byte request", chosen);
    heap.free(chosen);
  }
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Grow a live allocation in place via forward coalescing, then force
  //    a relocation by leaving no room to grow into.
  // --------------------------------------------------------------------
  heap.reset_heap_for_testing();
  heap.set_policy(AllocationPolicy::FirstFit);

  println!("\n[4] Grow in place via forward coalesce");
  let p = heap.allocate(64);
  let plug = heap.allocate(64);
  heap.free(plug);
  let grown = heap.reallocate(p, 200);
  println!("[4] original={:?} grown={:?} (same address: {})", p, grown, grown == p);
  block_until_enter_pressed();

  println!("\n[5] Force a relocation");
  let q = heap.allocate(64);
  let _blocker = heap.allocate(64);
  let moved = heap.reallocate(q, 4096);
  println!("[5] original={:?} moved={:?} (same address: {})", q, moved, moved == q);
  block_until_enter_pressed();

  println!("\n[6] Consistency check: {:?}", heap.check_heap_consistency());
  println!("\nEnd of demo. Process will exit and the OS reclaims all mappings.");
}
