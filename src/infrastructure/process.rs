//! System process launcher
//!
//! Spawns the server with `std::process::Command`. On Unix the child gets
//! its own process group so that a terminate reaches the whole tree (shell
//! wrappers, reloaders, worker processes).

use std::io::{self, BufRead, BufReader, Read};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::domain::ports::{LaunchSpec, OutputMode, ProcessLauncher};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(200);

/// Prefix for relayed server output lines
pub const SERVER_PREFIX: &str = "[server]";

/// A spawned server plus the threads relaying its output
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
    readers: Vec<JoinHandle<()>>,
    reaped: bool,
}

impl ChildHandle {
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

/// Real process control for the supervisor
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    pub fn new() -> Self {
        Self
    }

    fn build_command(spec: &LaunchSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.working_dir)
            .envs(&spec.env)
            .stdin(Stdio::null());

        match spec.output {
            OutputMode::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Prefixed | OutputMode::PrefixedStderr => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputMode::Null => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd
    }

    /// Spawn `spec` without keeping a handle: used by the one-shot restart
    /// command, where the server must outlive the supervisor.
    pub fn spawn_detached(spec: &LaunchSpec) -> io::Result<u32> {
        let mut cmd = Self::build_command(spec);
        match spec.output {
            OutputMode::Prefixed => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::PrefixedStderr => {
                cmd.stdout(Stdio::from(io::stderr())).stderr(Stdio::inherit());
            }
            OutputMode::Inherit | OutputMode::Null => {}
        }
        let child = cmd.spawn()?;
        let pid = child.id();
        tracing::debug!("spawned detached `{}` as pid {}", spec.display(), pid);
        Ok(pid)
    }

    fn wait_for_exit(handle: &mut ChildHandle, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match handle.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!("pid {} exited: {}", handle.child.id(), status);
                    handle.reaped = true;
                    return true;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!("waiting on pid {} failed: {}", handle.child.id(), err);
                    return false;
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl ProcessLauncher for SystemLauncher {
    type Handle = ChildHandle;

    fn launch(&mut self, spec: &LaunchSpec) -> io::Result<ChildHandle> {
        let mut child = Self::build_command(spec).spawn()?;
        tracing::debug!(
            "spawned `{}` in {} as pid {}",
            spec.display(),
            spec.working_dir.display(),
            child.id()
        );

        let mut readers = Vec::new();
        let to_stderr = spec.output == OutputMode::PrefixedStderr;
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, to_stderr)?);
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, true)?);
        }

        Ok(ChildHandle {
            child,
            readers,
            reaped: false,
        })
    }

    fn terminate(&mut self, handle: &mut ChildHandle, timeout: Duration) -> bool {
        if handle.reaped {
            return true;
        }
        let pid = handle.child.id();
        signal_terminate(&mut handle.child);
        tracing::debug!("sent terminate to pid {}", pid);
        Self::wait_for_exit(handle, timeout)
    }

    fn force_kill(&mut self, handle: &mut ChildHandle) {
        // Group members can outlive the leader, so the group is killed even
        // after the leader was reaped. A group that is already empty is fine.
        kill_group(&handle.child);
        if !handle.reaped {
            let _ = handle.child.kill();
            if let Err(err) = handle.child.wait() {
                tracing::warn!("reaping pid {} failed: {}", handle.child.id(), err);
            }
            handle.reaped = true;
        }
        // Readers end once the pipes close; grandchildren holding them are not waited for.
        for reader in handle.readers.drain(..) {
            if reader.is_finished() {
                let _ = reader.join();
            }
        }
    }

    fn is_alive(&mut self, handle: &mut ChildHandle) -> bool {
        if handle.reaped {
            return false;
        }
        match handle.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!("pid {} exited: {}", handle.child.id(), status);
                handle.reaped = true;
                false
            }
            Ok(None) => true,
            Err(_) => false,
        }
    }

    fn pid(&self, handle: &ChildHandle) -> Option<u32> {
        Some(handle.id())
    }

    fn reclaim_port(&mut self, port: u16) -> io::Result<Vec<u32>> {
        let own = std::process::id();
        let pids: Vec<u32> = listening_pids(port)?
            .into_iter()
            .filter(|pid| *pid != own)
            .collect();
        for pid in &pids {
            tracing::info!("killing pid {} holding port {}", pid, port);
            kill_pid(*pid);
        }
        Ok(pids)
    }

    fn is_listening(&mut self, port: u16) -> bool {
        PortProbe::new(port).is_listening()
    }
}

/// TCP checks against a local port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortProbe {
    port: u16,
}

impl PortProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Something accepts connections on 127.0.0.1:port
    pub fn is_listening(&self) -> bool {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok()
    }

    /// The port can be bound right now
    pub fn is_free(&self) -> bool {
        TcpListener::bind((Ipv4Addr::UNSPECIFIED, self.port)).is_ok()
    }
}

fn spawn_reader<R>(stream: R, to_stderr: bool) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("relaunch-output".to_string())
        .spawn(move || {
            let reader = BufReader::new(stream);
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                if to_stderr {
                    eprintln!("{} {}", SERVER_PREFIX, line);
                } else {
                    println!("{} {}", SERVER_PREFIX, line);
                }
            }
        })
}

/// Pids with a listening TCP socket on `port` (Unix, via `lsof`)
#[cfg(unix)]
fn listening_pids(port: u16) -> io::Result<Vec<u32>> {
    let output = Command::new("lsof")
        .arg("-t")
        .arg(format!("-iTCP:{}", port))
        .arg("-sTCP:LISTEN")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()?;
    // lsof exits 1 when nothing matches
    Ok(parse_pid_list(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(not(unix))]
fn listening_pids(_port: u16) -> io::Result<Vec<u32>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "port reclaim is only supported on Unix",
    ))
}

fn parse_pid_list(text: &str) -> Vec<u32> {
    let mut pids: Vec<u32> = text
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

#[cfg(unix)]
fn signal_group(child: &Child, signal: libc::c_int) -> bool {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return false;
    };
    // SAFETY: plain kill(2) on the child's process group; no memory is shared.
    unsafe { libc::kill(-pid, signal) == 0 }
}

#[cfg(unix)]
fn signal_terminate(child: &mut Child) {
    if !signal_group(child, libc::SIGTERM) {
        // Group already gone or never created; fall back to the child alone.
        // SAFETY: see `signal_group`.
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

#[cfg(not(unix))]
fn signal_terminate(child: &mut Child) {
    // No graceful signal available; the wait that follows observes the exit.
    let _ = child.kill();
}

#[cfg(unix)]
fn kill_group(child: &Child) {
    signal_group(child, libc::SIGKILL);
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

#[cfg(unix)]
fn kill_pid(pid: u32) {
    if let Ok(pid) = libc::pid_t::try_from(pid) {
        // SAFETY: kill(2) on a pid reported by lsof.
        unsafe {
            libc::kill(pid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_pid(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pid_list_skips_noise_and_dedups() {
        assert_eq!(parse_pid_list("42\n7\n\n42\nnot-a-pid\n"), vec![7, 42]);
        assert!(parse_pid_list("").is_empty());
    }

    #[test]
    fn port_probe_sees_a_bound_listener() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = PortProbe::new(port);
        assert!(probe.is_listening());
        drop(listener);
    }

    #[test]
    fn port_probe_reports_closed_port() {
        let port = {
            let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(!PortProbe::new(port).is_listening());
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use std::path::PathBuf;

        fn spec(script: &str) -> LaunchSpec {
            let argv = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
            LaunchSpec::from_argv(&argv, PathBuf::from("."), 0)
                .unwrap()
                .with_output(OutputMode::Null)
        }

        #[test]
        fn launch_and_terminate_sleeping_process() {
            let mut launcher = SystemLauncher::new();
            let mut handle = launcher.launch(&spec("sleep 30")).unwrap();
            assert!(launcher.is_alive(&mut handle));
            assert!(launcher.pid(&handle).is_some());

            assert!(launcher.terminate(&mut handle, Duration::from_secs(5)));
            assert!(!launcher.is_alive(&mut handle));
            launcher.force_kill(&mut handle);
        }

        #[test]
        fn process_ignoring_terminate_is_force_killed() {
            let mut launcher = SystemLauncher::new();
            let mut handle = launcher
                .launch(&spec("trap '' TERM; while true; do sleep 0.05; done"))
                .unwrap();
            // Give the shell time to install the trap.
            std::thread::sleep(Duration::from_millis(200));

            assert!(!launcher.terminate(&mut handle, Duration::from_millis(200)));
            launcher.force_kill(&mut handle);
            assert!(!launcher.is_alive(&mut handle));
        }

        /// Alive and not a zombie waiting for a reaper
        fn pid_is_running(pid: libc::pid_t) -> bool {
            // SAFETY: signal 0 only checks that the pid exists.
            if unsafe { libc::kill(pid, 0) } != 0 {
                return false;
            }
            match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
                Ok(stat) => !stat
                    .rsplit(')')
                    .next()
                    .is_some_and(|rest| rest.trim_start().starts_with('Z')),
                Err(_) => true,
            }
        }

        #[test]
        fn group_member_ignoring_terminate_dies_with_the_group() {
            let dir = tempfile::tempdir().unwrap();
            let pid_file = dir.path().join("member.pid");
            let script = format!(
                "(trap '' TERM; exec sleep 30) & echo $! > '{}'; sleep 30",
                pid_file.display()
            );
            let mut launcher = SystemLauncher::new();
            let mut handle = launcher.launch(&spec(&script)).unwrap();

            let deadline = Instant::now() + Duration::from_secs(5);
            let member = loop {
                if let Some(pid) = std::fs::read_to_string(&pid_file)
                    .ok()
                    .and_then(|text| text.trim().parse::<libc::pid_t>().ok())
                {
                    break pid;
                }
                assert!(Instant::now() < deadline, "member pid never written");
                std::thread::sleep(Duration::from_millis(10));
            };
            // Let the subshell install its trap before the terminate lands.
            std::thread::sleep(Duration::from_millis(200));

            launcher.terminate(&mut handle, Duration::from_millis(500));
            assert!(!launcher.is_alive(&mut handle));
            assert!(pid_is_running(member), "member should have ignored the terminate");

            launcher.force_kill(&mut handle);

            let deadline = Instant::now() + Duration::from_secs(2);
            while pid_is_running(member) && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(10));
            }
            assert!(!pid_is_running(member), "group member {} survived", member);
        }

        #[test]
        fn crashed_leader_does_not_leave_its_group_behind() {
            let dir = tempfile::tempdir().unwrap();
            let pid_file = dir.path().join("member.pid");
            let script = format!(
                "sleep 30 & echo $! > '{}'; exit 1",
                pid_file.display()
            );
            let mut launcher = SystemLauncher::new();
            let mut handle = launcher.launch(&spec(&script)).unwrap();

            let deadline = Instant::now() + Duration::from_secs(5);
            while launcher.is_alive(&mut handle) && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(10));
            }
            assert!(!launcher.is_alive(&mut handle));
            let member: libc::pid_t = std::fs::read_to_string(&pid_file)
                .unwrap()
                .trim()
                .parse()
                .unwrap();

            launcher.force_kill(&mut handle);

            let deadline = Instant::now() + Duration::from_secs(2);
            while pid_is_running(member) && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(10));
            }
            assert!(!pid_is_running(member), "orphaned member {} survived", member);
        }

        #[test]
        fn exited_process_is_not_alive() {
            let mut launcher = SystemLauncher::new();
            let mut handle = launcher.launch(&spec("exit 3")).unwrap();
            let deadline = Instant::now() + Duration::from_secs(5);
            while launcher.is_alive(&mut handle) && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(10));
            }
            assert!(!launcher.is_alive(&mut handle));
            // Terminating an already-reaped child is a no-op success.
            assert!(launcher.terminate(&mut handle, Duration::from_millis(10)));
        }

        #[test]
        fn missing_program_fails_to_launch() {
            let argv = vec!["relaunch-definitely-not-a-program".to_string()];
            let spec = LaunchSpec::from_argv(&argv, PathBuf::from("."), 0).unwrap();
            assert!(SystemLauncher::new().launch(&spec).is_err());
        }
    }
}
