//! Pool and node status strings reported by the Kubernetes API.

use std::fmt;

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $raw:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum $name {
            /// Status not recognised by this client.
            Unknown,
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Parses an API status string; unrecognised values map to
            /// `Unknown`.
            #[must_use]
            pub fn parse(raw: &str) -> Self {
                match raw.trim() {
                    $($raw => Self::$variant,)+
                    _ => Self::Unknown,
                }
            }

            /// API spelling of the status.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    Self::Unknown => "unknown",
                    $(Self::$variant => $raw,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum!(
    /// Lifecycle status of a Kapsule pool.
    PoolStatus {
        /// All nodes provisioned.
        Ready => "ready",
        /// Deletion in progress.
        Deleting => "deleting",
        /// Deleted.
        Deleted => "deleted",
        /// Nodes being added or removed.
        Scaling => "scaling",
        /// Degraded but serving.
        Warning => "warning",
        /// Locked by Scaleway.
        Locked => "locked",
        /// Kubernetes version upgrade in progress.
        Upgrading => "upgrading",
    }
);

status_enum!(
    /// Lifecycle status of a Kapsule node.
    NodeStatus {
        /// Instance being created.
        Creating => "creating",
        /// Registered but not schedulable.
        NotReady => "not_ready",
        /// Schedulable.
        Ready => "ready",
        /// Deletion in progress.
        Deleting => "deleting",
        /// Deleted.
        Deleted => "deleted",
        /// Locked by Scaleway.
        Locked => "locked",
        /// Rebooting.
        Rebooting => "rebooting",
        /// Instance creation failed.
        CreationError => "creation_error",
        /// Kubernetes version upgrade in progress.
        Upgrading => "upgrading",
        /// Instance booting.
        Starting => "starting",
        /// Joining the cluster.
        Registering => "registering",
    }
);
