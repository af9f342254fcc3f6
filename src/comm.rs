//! Communicators of a mesh.
//!
//! The writer only needs to know how many processes share a mesh, which one it runs on, and
//! whether all of them succeeded at a step. [`SerialComm`] is used for meshes that live on a
//! single process. With the `mpi` feature, [`MpiComm`] wraps an MPI communicator.

/// The participants that collectively hold a mesh
pub trait Communicator {
    /// whether this communicator type can span more than one process at all
    const DISTRIBUTED: bool;

    /// number of participants
    fn size(&self) -> usize;

    /// index of this participant in `0..size()`
    fn rank(&self) -> usize;

    /// Collective: every participant passes its own outcome and all of them get `true` only if
    /// every outcome was `true`. Blocks until all participants have called it.
    fn all_ok(&self, ok: bool) -> bool;
}

/// Communicator of a mesh that is owned entirely by the current process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SerialComm;

impl Communicator for SerialComm {
    const DISTRIBUTED: bool = false;

    fn size(&self) -> usize {
        1
    }

    fn rank(&self) -> usize {
        0
    }

    fn all_ok(&self, ok: bool) -> bool {
        ok
    }
}

impl<C: Communicator> Communicator for &C {
    const DISTRIBUTED: bool = C::DISTRIBUTED;

    fn size(&self) -> usize {
        (*self).size()
    }

    fn rank(&self) -> usize {
        (*self).rank()
    }

    fn all_ok(&self, ok: bool) -> bool {
        (*self).all_ok(ok)
    }
}

#[cfg(feature = "mpi")]
mod mpi_backend {
    use super::Communicator;
    use mpi::collective::SystemOperation;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{Communicator as _, CommunicatorCollectives as _};

    /// An MPI communicator, usually the world communicator of an initialized universe
    pub struct MpiComm {
        pub world: SimpleCommunicator,
    }

    impl MpiComm {
        pub fn new(world: SimpleCommunicator) -> Self {
            Self { world }
        }
    }

    impl Communicator for MpiComm {
        const DISTRIBUTED: bool = true;

        fn size(&self) -> usize {
            self.world.size() as usize
        }

        fn rank(&self) -> usize {
            self.world.rank() as usize
        }

        fn all_ok(&self, ok: bool) -> bool {
            let mut all = 0i32;
            self.world
                .all_reduce_into(&(ok as i32), &mut all, SystemOperation::min());
            all == 1
        }
    }
}

#[cfg(feature = "mpi")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_comm_is_a_single_participant() {
        let comm = SerialComm;
        assert_eq!(comm.size(), 1);
        assert_eq!(comm.rank(), 0);
        assert!(!SerialComm::DISTRIBUTED);
        assert!(comm.all_ok(true));
        assert!(!comm.all_ok(false));
    }

    #[test]
    fn references_forward() {
        let comm = SerialComm;
        let by_ref = &comm;
        assert_eq!(by_ref.size(), 1);
        assert!(!by_ref.all_ok(false));
        assert!(!<&SerialComm as Communicator>::DISTRIBUTED);
    }
}
