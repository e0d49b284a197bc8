use super::*;

#[test]
fn test_handles_recycle_per_bucket() {
  let mut pool = MeshHandlePool::new();
  let a = pool.acquire(0);
  let b = pool.acquire(1);
  assert_ne!(a, b);
  assert_eq!(pool.live_count(), 2);

  pool.release(a);
  assert_eq!(pool.free_count(), 1);

  // Another bucket does not take a LOD 0 handle.
  let c = pool.acquire(1);
  assert_ne!(c, a);

  let d = pool.acquire(0);
  assert_eq!(d, a);
  assert_eq!(pool.free_count(), 0);
  assert_eq!(pool.live_count(), 3);
}

#[test]
fn test_update_handle() {
  let mut pool = MeshHandlePool::new();
  let handle = pool.acquire(2);
  let update = MeshUpdate::Release { handle };
  assert_eq!(update.handle(), handle);
  assert_eq!(update.handle().bucket(), 2);
}
