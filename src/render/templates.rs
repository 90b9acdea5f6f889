//! Fixed artifact bodies.
//!
//! `INCLUDE` and `LOG` are consumed verbatim by the agent image; keep them
//! byte-for-byte stable (tab indentation included).

pub const INCLUDE: &str = "# includes all files
@include /fluentd/etc/system.conf
@include /fluentd/etc/app.conf
@include /fluentd/etc/log.conf
";

pub const LOG: &str = "# Do not collect fluentd's own logs to avoid infinite loops.
<match **>
\t@type null
\t@id main-no-output
</match>
<label @FLUENT_LOG>
\t<match fluent.*>
\t\t@type null
\t\t@id main-fluentd-log
\t</match>
</label>
";

pub const RPC_ENDPOINT: &str = "127.0.0.1:24444";

/// Buffer root shared by workers; only set in multi-worker mode.
pub const BUFFER_ROOT: &str = "/buffers";

/// `system.conf` for `workers` worker processes.
pub fn system(workers: u32) -> String {
    let mut out = String::from("# Enable RPC endpoint\n<system>\n");
    out.push_str(&format!("\trpc_endpoint {}\n", RPC_ENDPOINT));
    out.push_str("\tlog_level info\n");
    out.push_str(&format!("\tworkers {}\n", workers.max(1)));
    if workers > 1 {
        out.push_str(&format!("\troot_dir {}\n", BUFFER_ROOT));
    }
    out.push_str("</system>\n");
    out
}
