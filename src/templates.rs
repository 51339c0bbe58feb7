//! Config file rendering
//!
//! Each renderer builds the file line by line from typed settings. The
//! output is intentionally small: just what the processes in the process
//! table need to start and talk to each other.

use std::path::{Path, PathBuf};

/// Placeholder replaced with the platform port when the container starts
pub const PORT_PLACEHOLDER: &str = "${PORT}";

/// Settings for `php.ini`
#[derive(Debug, Clone)]
pub struct PhpIniConfig {
    pub app_root: PathBuf,
    pub lib_directory: String,
    pub php_home: String,
    pub php_api: String,
}

/// Settings for `php-fpm.conf`
#[derive(Debug, Clone)]
pub struct PhpFpmConfig {
    pub php_home: PathBuf,
    pub listen: String,
    /// Glob of user pool configs to include, if any exist
    pub include: Option<String>,
}

/// Settings for `httpd.conf`
#[derive(Debug, Clone)]
pub struct HttpdConfig {
    pub server_admin: String,
    pub app_root: PathBuf,
    pub web_directory: String,
    pub fpm_socket: String,
    pub https_redirect: bool,
}

/// Settings for `nginx.conf`
#[derive(Debug, Clone)]
pub struct NginxConfig {
    pub app_root: PathBuf,
    pub web_directory: String,
    pub fpm_socket: PathBuf,
    pub https_redirect: bool,
}

fn doc_root(app_root: &Path, web_directory: &str) -> String {
    app_root.join(web_directory).display().to_string()
}

/// Render `php.ini`
pub fn php_ini(cfg: &PhpIniConfig) -> String {
    let include_path = cfg.app_root.join(&cfg.lib_directory);
    let lines = [
        "[PHP]".to_string(),
        "engine = On".to_string(),
        "short_open_tag = Off".to_string(),
        "expose_php = Off".to_string(),
        "max_execution_time = 30".to_string(),
        "memory_limit = 128M".to_string(),
        "error_reporting = E_ALL & ~E_DEPRECATED & ~E_STRICT".to_string(),
        "display_errors = Off".to_string(),
        "log_errors = On".to_string(),
        "variables_order = \"EGPCS\"".to_string(),
        "post_max_size = 8M".to_string(),
        "upload_max_filesize = 2M".to_string(),
        format!(
            "include_path = \".:/usr/share/php:{}\"",
            include_path.display()
        ),
        format!(
            "extension_dir = \"{}/lib/php/extensions/no-debug-non-zts-{}\"",
            cfg.php_home, cfg.php_api
        ),
        String::new(),
        "[Date]".to_string(),
        "date.timezone = UTC".to_string(),
        String::new(),
    ];
    lines.join("\n")
}

/// Render `php-fpm.conf`
pub fn php_fpm_conf(cfg: &PhpFpmConfig) -> String {
    let mut lines = vec![
        "[global]".to_string(),
        format!("pid = {}", cfg.php_home.join("php-fpm.pid").display()),
        "error_log = /proc/self/fd/2".to_string(),
        "daemonize = no".to_string(),
        String::new(),
        "[www]".to_string(),
        format!("listen = {}", cfg.listen),
        "pm = dynamic".to_string(),
        "pm.max_children = 5".to_string(),
        "pm.start_servers = 2".to_string(),
        "pm.min_spare_servers = 1".to_string(),
        "pm.max_spare_servers = 3".to_string(),
        "clear_env = no".to_string(),
        "catch_workers_output = yes".to_string(),
    ];

    if let Some(include) = &cfg.include {
        lines.push(String::new());
        lines.push(format!("include = {}", include));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Render `httpd.conf`
pub fn httpd_conf(cfg: &HttpdConfig) -> String {
    let root = doc_root(&cfg.app_root, &cfg.web_directory);
    let mut lines = vec![
        "ServerRoot \"${SERVER_ROOT}\"".to_string(),
        format!("Listen {}", PORT_PLACEHOLDER),
        format!("ServerAdmin \"{}\"", cfg.server_admin),
        "ServerName \"0.0.0.0\"".to_string(),
        format!("DocumentRoot \"{}\"", root),
        String::new(),
        "LoadModule mpm_event_module modules/mod_mpm_event.so".to_string(),
        "LoadModule authz_core_module modules/mod_authz_core.so".to_string(),
        "LoadModule dir_module modules/mod_dir.so".to_string(),
        "LoadModule mime_module modules/mod_mime.so".to_string(),
        "LoadModule log_config_module modules/mod_log_config.so".to_string(),
        "LoadModule rewrite_module modules/mod_rewrite.so".to_string(),
        "LoadModule proxy_module modules/mod_proxy.so".to_string(),
        "LoadModule proxy_fcgi_module modules/mod_proxy_fcgi.so".to_string(),
        "LoadModule unixd_module modules/mod_unixd.so".to_string(),
        String::new(),
        "ErrorLog /proc/self/fd/2".to_string(),
        "CustomLog /proc/self/fd/1 \"%h %l %u %t \\\"%r\\\" %>s %b\"".to_string(),
        "DirectoryIndex index.php index.html".to_string(),
        String::new(),
        format!("<Directory \"{}\">", root),
        "  AllowOverride All".to_string(),
        "  Require all granted".to_string(),
        "</Directory>".to_string(),
        String::new(),
        "<FilesMatch \"\\.php$\">".to_string(),
        format!("  SetHandler proxy:fcgi://{}", cfg.fpm_socket),
        "</FilesMatch>".to_string(),
    ];

    if cfg.https_redirect {
        lines.extend([
            String::new(),
            "RewriteEngine On".to_string(),
            "RewriteCond %{HTTP:X-Forwarded-Proto} =http".to_string(),
            "RewriteRule .* https://%{HTTP:Host}%{REQUEST_URI} [L,R=301]".to_string(),
        ]);
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Render `nginx.conf`
pub fn nginx_conf(cfg: &NginxConfig) -> String {
    let root = doc_root(&cfg.app_root, &cfg.web_directory);
    let mut lines = vec![
        "daemon off;".to_string(),
        "error_log stderr;".to_string(),
        "worker_processes auto;".to_string(),
        "pid /tmp/nginx.pid;".to_string(),
        String::new(),
        "events {".to_string(),
        "    worker_connections 1024;".to_string(),
        "}".to_string(),
        String::new(),
        "http {".to_string(),
        "    access_log /dev/stdout;".to_string(),
        "    default_type application/octet-stream;".to_string(),
        "    sendfile on;".to_string(),
        "    port_in_redirect off;".to_string(),
        format!("    root {};", root),
        String::new(),
        "    upstream php_fpm {".to_string(),
        format!("        server unix:{};", cfg.fpm_socket.display()),
        "    }".to_string(),
        String::new(),
        "    server {".to_string(),
        format!("        listen {};", PORT_PLACEHOLDER),
        "        server_name localhost;".to_string(),
        "        index index.php index.html;".to_string(),
    ];

    if cfg.https_redirect {
        lines.extend([
            String::new(),
            "        if ($http_x_forwarded_proto = \"http\") {".to_string(),
            "            return 301 https://$host$request_uri;".to_string(),
            "        }".to_string(),
        ]);
    }

    lines.extend([
        String::new(),
        "        location ~ \\.php$ {".to_string(),
        "            try_files $uri =404;".to_string(),
        "            include fastcgi_params;".to_string(),
        "            fastcgi_param SCRIPT_FILENAME $document_root$fastcgi_script_name;".to_string(),
        "            fastcgi_pass php_fpm;".to_string(),
        "        }".to_string(),
        "    }".to_string(),
        "}".to_string(),
        String::new(),
    ]);

    lines.join("\n")
}

/// Render the Redis session handler ini
pub fn redis_session_ini(host: &str, port: u16, password: Option<&str>) -> String {
    let mut save_path = format!("tcp://{}:{}", host, port);
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        save_path.push_str("?auth=");
        save_path.push_str(&urlencoding::encode(password));
    }

    let lines = [
        "extension=redis.so".to_string(),
        "extension=igbinary.so".to_string(),
        "session.name=PHPSESSIONID".to_string(),
        "session.save_handler=redis".to_string(),
        format!("session.save_path={}", save_path),
        String::new(),
    ];
    lines.join("\n")
}

/// Render the Memcached session handler ini
pub fn memcached_session_ini(servers: &str, username: &str, password: &str) -> String {
    let lines = [
        "extension=memcached.so".to_string(),
        "extension=igbinary.so".to_string(),
        "extension=msgpack.so".to_string(),
        "session.name=PHPSESSIONID".to_string(),
        "session.save_handler=memcached".to_string(),
        format!("session.save_path={}", quoted(servers)),
        "memcached.sess_binary_protocol=On".to_string(),
        "memcached.sess_persistent=On".to_string(),
        format!("memcached.sess_sasl_username={}", quoted(username)),
        format!("memcached.sess_sasl_password={}", quoted(password)),
        String::new(),
    ];
    lines.join("\n")
}

/// Double-quote an ini value, escaping quotes and backslashes
fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
