//! Unix pty plumbing
//!
//! Safe wrapper around the raw pty syscalls: `forkpty` to allocate the
//! pair and spawn the child, zero-timeout `poll` so the pump never
//! blocks, and plain `read`/`write` on the master side. All unsafe code
//! in the crate lives here.

use std::ffi::CString;
use std::io;
use std::ptr;

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("failed to allocate pty and fork: {0}")]
    Fork(#[source] io::Error),

    #[error("command contains an interior NUL byte")]
    BadCommand,
}

pub type Result<T> = std::result::Result<T, PtyError>;

/// The master side of a pty pair with a child process on the slave side.
///
/// The descriptor is closed on drop. Dropping does not signal or reap
/// the child; the host observes its death out of band.
pub struct Pty {
    fd: libc::c_int,
    child: libc::pid_t,
}

impl Pty {
    /// Allocate a pty sized to the terminal, fork, and exec
    /// `/bin/sh -c <command>` in the child with `TERM=linux` so it emits
    /// the escape subset the interpreter understands. The child exits
    /// 127 when the exec fails. On failure no pty is left behind.
    pub fn spawn(rows: u16, cols: u16, command: &str) -> Result<Pty> {
        let command = CString::new(command).map_err(|_| PtyError::BadCommand)?;

        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        ws.ws_row = rows;
        ws.ws_col = cols;

        let mut master: libc::c_int = -1;
        let pid = unsafe { libc::forkpty(&mut master, ptr::null_mut(), ptr::null_mut(), &mut ws) };
        if pid < 0 {
            return Err(PtyError::Fork(io::Error::last_os_error()));
        }
        if pid == 0 {
            // Child, running under the slave side of the pty. Only
            // async-signal-safe calls from here to the exec.
            unsafe {
                libc::setenv(
                    b"TERM\0".as_ptr().cast(),
                    b"linux\0".as_ptr().cast(),
                    1,
                );
                let sh = b"/bin/sh\0".as_ptr().cast::<libc::c_char>();
                let argv = [
                    sh,
                    b"-c\0".as_ptr().cast::<libc::c_char>(),
                    command.as_ptr(),
                    ptr::null(),
                ];
                libc::execv(sh, argv.as_ptr());
                libc::_exit(127);
            }
        }

        info!(pid, rows, cols, "spawned child under pty");
        Ok(Pty { fd: master, child: pid })
    }

    pub fn child_pid(&self) -> libc::pid_t {
        self.child
    }

    /// The master descriptor, for hosts that want to multiplex on it.
    pub fn raw_fd(&self) -> libc::c_int {
        self.fd
    }

    /// Zero-timeout poll: true when a read would not block. Never
    /// blocks; a poll error reads as "nothing to read".
    pub fn poll_readable(&self) -> bool {
        let mut fds = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let n = unsafe { libc::poll(&mut fds, 1, 0) };
        n > 0 && fds.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0
    }

    /// Read whatever is available, up to `buf.len()` bytes. None on EOF
    /// or error, after which the pump gives up for this turn.
    pub fn read(&self, buf: &mut [u8]) -> Option<usize> {
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n > 0 {
            Some(n as usize)
        } else {
            None
        }
    }

    /// A single write syscall; short writes are the caller's loop to
    /// finish.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.fd, buf.as_ptr().cast(), buf.len()) };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
