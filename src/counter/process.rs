//! Cross-process counter in System V shared memory
//!
//! The value lives in a private shared memory segment (`shmget` +
//! `shmat`) and is guarded by a one-element System V semaphore set
//! initialised to 1. Both are kernel objects that outlive ordinary process
//! memory, so they are tied to a [`ProcessCounter`] value whose `Drop`
//! removes them on every exit path of the creating process.
//!
//! Because the segment is attached before `fork`, every child inherits the
//! same mapping and increments the same integer. Children never remove the
//! kernel objects: only the process that created them does.
//!
//! Semaphore operations use `SEM_UNDO`, so a child that dies while holding
//! the lock does not leave it held forever.

use super::{CounterError, SharedCounter};
use std::io;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter in System V shared memory guarded by a System V semaphore
#[derive(Debug)]
pub struct ProcessCounter {
    shm_id: libc::c_int,
    sem_id: libc::c_int,
    value: *mut AtomicU64,
    owner_pid: libc::pid_t,
    released: bool,
}

/// Sizes of the System V objects behind one counter
#[derive(Debug, Clone, Copy)]
struct IpcRequest {
    segment_bytes: usize,
    semaphores: libc::c_int,
}

impl IpcRequest {
    const COUNTER: Self = Self {
        segment_bytes: mem::size_of::<AtomicU64>(),
        semaphores: 1,
    };
}

// Safety: the mapped value is only mutated while holding the semaphore, and
// the mapping stays valid until `release`, which requires `&mut self`.
unsafe impl Send for ProcessCounter {}
unsafe impl Sync for ProcessCounter {}

impl ProcessCounter {
    /// Allocate the segment and the semaphore and set the value to `initial`
    ///
    /// On failure every object created so far is removed before the error is
    /// returned.
    pub fn create(initial: u64) -> Result<Self, CounterError> {
        Self::create_with(initial, IpcRequest::COUNTER, &mut |_: IpcObject| {})
    }

    /// Allocation steps behind [`create`](Self::create)
    ///
    /// `on_created` sees every kernel object as soon as it exists, including
    /// ones that are removed again because a later step failed.
    fn create_with(
        initial: u64,
        request: IpcRequest,
        on_created: &mut dyn FnMut(IpcObject),
    ) -> Result<Self, CounterError> {
        let shm_id = unsafe {
            libc::shmget(
                libc::IPC_PRIVATE,
                request.segment_bytes,
                libc::IPC_CREAT | 0o600,
            )
        };
        if shm_id == -1 {
            return Err(CounterError::ResourceExhaustion {
                resource: "shared memory segment",
                source: io::Error::last_os_error(),
            });
        }

        on_created(IpcObject::SharedMemory(shm_id));

        let addr = unsafe { libc::shmat(shm_id, ptr::null(), 0) };
        if addr as isize == -1 {
            let source = io::Error::last_os_error();
            unsafe {
                libc::shmctl(shm_id, libc::IPC_RMID, ptr::null_mut());
            }
            return Err(CounterError::ResourceExhaustion {
                resource: "shared memory attachment",
                source,
            });
        }

        let sem_id = unsafe {
            libc::semget(libc::IPC_PRIVATE, request.semaphores, libc::IPC_CREAT | 0o600)
        };
        if sem_id == -1 {
            let source = io::Error::last_os_error();
            unsafe {
                libc::shmdt(addr);
                libc::shmctl(shm_id, libc::IPC_RMID, ptr::null_mut());
            }
            return Err(CounterError::ResourceExhaustion {
                resource: "semaphore",
                source,
            });
        }

        on_created(IpcObject::Semaphore(sem_id));

        if unsafe { libc::semctl(sem_id, 0, libc::SETVAL, 1 as libc::c_int) } == -1 {
            let source = io::Error::last_os_error();
            unsafe {
                libc::semctl(sem_id, 0, libc::IPC_RMID);
                libc::shmdt(addr);
                libc::shmctl(shm_id, libc::IPC_RMID, ptr::null_mut());
            }
            return Err(CounterError::ResourceExhaustion {
                resource: "semaphore initialisation",
                source,
            });
        }

        let value = addr as *mut AtomicU64;
        unsafe {
            ptr::write(value, AtomicU64::new(initial));
        }

        Ok(Self {
            shm_id,
            sem_id,
            value,
            owner_pid: unsafe { libc::getpid() },
            released: false,
        })
    }

    /// System V id of the shared memory segment
    pub fn shm_id(&self) -> libc::c_int {
        self.shm_id
    }

    /// System V id of the semaphore set
    pub fn sem_id(&self) -> libc::c_int {
        self.sem_id
    }

    /// Detach and remove the segment and the semaphore
    ///
    /// Must only be called once every worker process has exited. Dropping
    /// the counter does the same thing but discards errors.
    pub fn destroy(mut self) -> Result<(), CounterError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), CounterError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        // A forked child holding an inherited copy must leave the kernel
        // objects alone; process exit detaches its mapping.
        if unsafe { libc::getpid() } != self.owner_pid {
            return Ok(());
        }

        let mut first_error = None;

        if unsafe { libc::shmdt(self.value as *const libc::c_void) } == -1 {
            first_error.get_or_insert(CounterError::Release {
                resource: "shared memory attachment",
                source: io::Error::last_os_error(),
            });
        }
        if unsafe { libc::shmctl(self.shm_id, libc::IPC_RMID, ptr::null_mut()) } == -1 {
            first_error.get_or_insert(CounterError::Release {
                resource: "shared memory segment",
                source: io::Error::last_os_error(),
            });
        }
        if unsafe { libc::semctl(self.sem_id, 0, libc::IPC_RMID) } == -1 {
            first_error.get_or_insert(CounterError::Release {
                resource: "semaphore",
                source: io::Error::last_os_error(),
            });
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn semaphore_op(&self, delta: libc::c_short) -> Result<(), CounterError> {
        let mut op = libc::sembuf {
            sem_num: 0,
            sem_op: delta,
            sem_flg: libc::SEM_UNDO as libc::c_short,
        };
        loop {
            if unsafe { libc::semop(self.sem_id, &mut op, 1) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(CounterError::Lock(err));
            }
        }
    }

    fn lock(&self) -> Result<SemaphoreGuard<'_>, CounterError> {
        self.semaphore_op(-1)?;
        Ok(SemaphoreGuard {
            counter: self,
            held: true,
        })
    }

    #[inline]
    fn cell(&self) -> &AtomicU64 {
        unsafe { &*self.value }
    }
}

impl SharedCounter for ProcessCounter {
    fn increment_with(&self, on_increment: &mut dyn FnMut(u64)) -> Result<u64, CounterError> {
        let guard = self.lock()?;

        // Plain load/store: the semaphore is what makes this read-modify-write
        // exclusive, and semop is a full barrier on both sides.
        let total = self.cell().load(Ordering::Relaxed) + 1;
        self.cell().store(total, Ordering::Relaxed);
        on_increment(total);

        guard.unlock()?;
        Ok(total)
    }

    fn read(&self) -> u64 {
        self.cell().load(Ordering::Acquire)
    }

    fn backing(&self) -> &'static str {
        "sysv-shm+semaphore"
    }
}

/// Held semaphore; posted again on drop
///
/// `SEM_UNDO` only applies at process exit, so a panic between wait and
/// post inside a long-lived process would otherwise keep the lock held.
struct SemaphoreGuard<'a> {
    counter: &'a ProcessCounter,
    held: bool,
}

impl SemaphoreGuard<'_> {
    fn unlock(mut self) -> Result<(), CounterError> {
        self.held = false;
        self.counter.semaphore_op(1)
    }
}

impl Drop for SemaphoreGuard<'_> {
    fn drop(&mut self) {
        if self.held {
            let _ = self.counter.semaphore_op(1);
        }
    }
}

impl Drop for ProcessCounter {
    fn drop(&mut self) {
        // Ignore errors on release - nothing we can do
        let _ = self.release();
    }
}

/// Kind of System V object, for [`ipc_object_exists`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcObject {
    SharedMemory(libc::c_int),
    Semaphore(libc::c_int),
}

/// Whether a System V object id still refers to a live kernel object
///
/// Used to check that nothing is orphaned after a run.
pub fn ipc_object_exists(object: IpcObject) -> bool {
    match object {
        IpcObject::SharedMemory(id) => {
            let mut ds: libc::shmid_ds = unsafe { mem::zeroed() };
            unsafe { libc::shmctl(id, libc::IPC_STAT, &mut ds) != -1 }
        }
        IpcObject::Semaphore(id) => unsafe { libc::semctl(id, 0, libc::GETVAL) != -1 },
    }
}
