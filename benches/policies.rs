use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use heapcore::config::AllocatorConfig;
use heapcore::{AllocationPolicy, Heap};

/// Allocates and frees a mixed-size working set under the given policy,
/// simulating a fragmented heap before timing the request of interest.
fn churn(heap: &Heap, policy: AllocationPolicy) {
  heap.reset_heap_for_testing();
  heap.set_policy(policy);

  let mut handles = Vec::with_capacity(64);
  for i in 0..64 {
    handles.push(heap.allocate(16 + (i % 7) * 32));
  }
  for (i, p) in handles.iter().enumerate() {
    if i % 3 != 0 {
      heap.free(*p);
    }
  }

  for _ in 0..256 {
    let p = heap.allocate(48);
    heap.free(p);
  }
}

fn bench_policies(c: &mut Criterion) {
  let heap = Heap::with_os_provider(AllocatorConfig::default());
  let mut group = c.benchmark_group("placement_policy");

  for policy in [AllocationPolicy::FirstFit, AllocationPolicy::BestFit, AllocationPolicy::WorstFit] {
    group.bench_with_input(BenchmarkId::from_parameter(format!("{policy:?}")), &policy, |b, &policy| {
      b.iter(|| churn(&heap, policy));
    });
  }

  group.finish();
}

criterion_group!(benches, bench_policies);
criterion_main!(benches);
