//! Turns kubeconfig entities into `kubectl config set-*` argument lists.
//!
//! Only fields that carry a value become flags, always in the same order. The target
//! `--kubeconfig` flag, when given, goes last.

use std::path::Path;

use log::warn;
use rustkube::{ClusterSpec, ContextSpec, UserSpec};

/// Flags whose value is replaced by `****` when an invocation is echoed.
const SECRET_FLAGS: &[&str] = &["--token", "--password"];

/// `<key>=<value>` flags that keep their key but have the value replaced when echoed.
const SECRET_PAIR_FLAGS: &[&str] = &["--auth-provider-arg", "--exec-env"];

struct Args(Vec<String>);

impl Args {
    fn new(subcommand: &str, name: &str) -> Self {
        Args(vec![
            "config".to_string(),
            subcommand.to_string(),
            name.to_string(),
        ])
    }

    fn flag(&mut self, flag: &str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.0.push(format!("{flag}={value}"));
        }
        self
    }

    fn opt_flag(&mut self, flag: &str, value: Option<impl AsRef<str>>) -> &mut Self {
        match value {
            Some(value) => self.flag(flag, value.as_ref()),
            None => self,
        }
    }

    fn finish(mut self, kubeconfig: Option<&Path>) -> Vec<String> {
        if let Some(path) = kubeconfig {
            self.flag("--kubeconfig", &path.display().to_string());
        }
        self.0
    }
}

fn skip_embedded(kind: &str, name: &str, field: &str, data: &Option<String>) {
    if data.as_deref().map_or(false, |d| !d.is_empty()) {
        warn!("{kind} {name}: {field} cannot be set through kubectl set flags; skipping it");
    }
}

pub fn set_cluster(name: &str, cluster: &ClusterSpec, kubeconfig: Option<&Path>) -> Vec<String> {
    skip_embedded(
        "cluster",
        name,
        "certificate-authority-data",
        &cluster.certificate_authority_data,
    );

    let mut args = Args::new("set-cluster", name);
    args.flag("--server", &cluster.server).opt_flag(
        "--certificate-authority",
        cluster
            .certificate_authority
            .as_ref()
            .map(|p| p.display().to_string()),
    );
    if cluster.insecure_skip_tls_verify {
        args.flag("--insecure-skip-tls-verify", "true");
    }
    args.opt_flag("--tls-server-name", cluster.tls_server_name.as_ref())
        .opt_flag("--proxy-url", cluster.proxy_url.as_ref());
    args.finish(kubeconfig)
}

pub fn set_credentials(name: &str, user: &UserSpec, kubeconfig: Option<&Path>) -> Vec<String> {
    skip_embedded(
        "user",
        name,
        "client-certificate-data",
        &user.client_certificate_data,
    );
    skip_embedded("user", name, "client-key-data", &user.client_key_data);

    let mut args = Args::new("set-credentials", name);
    args.opt_flag(
        "--client-certificate",
        user.client_certificate
            .as_ref()
            .map(|p| p.display().to_string()),
    )
    .opt_flag(
        "--client-key",
        user.client_key.as_ref().map(|p| p.display().to_string()),
    )
    .opt_flag("--token", user.token.as_ref())
    .opt_flag("--username", user.username.as_ref())
    .opt_flag("--password", user.password.as_ref());

    if let Some(provider) = &user.auth_provider {
        args.flag("--auth-provider", &provider.name);
        for (key, value) in &provider.config {
            args.flag("--auth-provider-arg", &format!("{key}={value}"));
        }
    }

    if let Some(exec) = user.exec.as_ref().filter(|e| !e.command.is_empty()) {
        args.flag("--exec-command", &exec.command)
            .opt_flag("--exec-api-version", exec.api_version.as_ref());
        for arg in &exec.args {
            args.flag("--exec-arg", arg);
        }
        for var in &exec.env {
            args.flag("--exec-env", &format!("{}={}", var.name, var.value));
        }
    }

    args.finish(kubeconfig)
}

pub fn set_context(name: &str, context: &ContextSpec, kubeconfig: Option<&Path>) -> Vec<String> {
    let mut args = Args::new("set-context", name);
    args.flag("--cluster", &context.cluster)
        .flag("--user", &context.user)
        .opt_flag("--namespace", context.namespace.as_ref());
    args.finish(kubeconfig)
}

/// Renders an argument list for display, masking credential values.
pub fn display_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((flag, _)) if SECRET_FLAGS.contains(&flag) => format!("{flag}=****"),
            Some((flag, pair)) if SECRET_PAIR_FLAGS.contains(&flag) => {
                match pair.split_once('=') {
                    Some((key, _)) => format!("{flag}={key}=****"),
                    None => format!("{flag}=****"),
                }
            }
            _ => arg.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
