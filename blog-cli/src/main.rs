use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use blog_client::{
    AuthResponse, BlogClient, BlogClientError, FileSessionStore, ListPostsResponse, ListQuery, NewPost,
    Post, PostUpdate, PostsCursor, Session, SessionManager,
};
use clap::{Parser, Subcommand};

const SESSION_FILE: &str = ".blog_session.json";
const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";
const SERVER_ENV: &str = "BLOG_SERVER_URL";

#[derive(Debug, Parser)]
#[command(name = "blog-cli", version, about = "CLI клиент для blog-server")]
struct Cli {
    /// Адрес сервера (по умолчанию `BLOG_SERVER_URL` или http://127.0.0.1:5000).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Файл, в котором хранится сессия между запусками.
    #[arg(long, global = true, default_value = SESSION_FILE)]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Регистрация пользователя.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Вход по email и паролю.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Выход: удаляет сохранённую сессию.
    Logout,
    /// Показывает текущего пользователя.
    Whoami,
    /// Создание поста (требует входа).
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Получение поста по id.
    Get {
        #[arg(long)]
        id: i64,
    },
    /// Обновление поста (требует входа). Не указанные поля не меняются.
    ///
    /// `--image-url ""` удаляет изображение.
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Удаление поста (требует входа).
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Список постов, новые первыми.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Поиск по заголовку или имени автора.
        #[arg(long)]
        search: Option<String>,
    },
    /// Мои посты (требует входа).
    Mine {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

impl Command {
    /// Команды, которые отправляют сохранённый токен: 401 на них значит, что сессия устарела.
    fn uses_session_token(&self) -> bool {
        matches!(
            self,
            Command::Create { .. }
                | Command::Update { .. }
                | Command::Delete { .. }
                | Command::Mine { .. }
        )
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let server = resolve_server(cli.server, std::env::var(SERVER_ENV).ok());
    let mut client = BlogClient::new(server).context("не удалось создать HTTP-клиент")?;

    let mut sessions = SessionManager::new(FileSessionStore::new(&cli.session_file));
    if let Some(session) = sessions
        .hydrate()
        .context("не удалось прочитать файл сессии")?
    {
        client.set_token(session.token.clone());
    }

    let uses_session = cli.command.uses_session_token();
    match execute(cli.command, &mut client, &mut sessions).await {
        Err(err) if err.is_unauthorized() && uses_session && sessions.current().is_some() => {
            sessions
                .logout()
                .context("не удалось удалить файл сессии")?;
            Err(map_client_error(err)).context("сессия сброшена, войдите снова")
        }
        result => result.map_err(map_client_error),
    }
}

async fn execute(
    command: Command,
    client: &mut BlogClient,
    sessions: &mut SessionManager<FileSessionStore>,
) -> Result<(), BlogClientError> {
    match command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let auth = client.register(&username, &email, &password).await?;
            print_auth(&auth);
            sessions.login(Session::from(auth))?;
        }
        Command::Login { email, password } => {
            let auth = client.login(&email, &password).await?;
            print_auth(&auth);
            sessions.login(Session::from(auth))?;
        }
        Command::Logout => {
            sessions.logout()?;
            client.clear_token();
            println!("Сессия завершена");
        }
        Command::Whoami => match sessions.current() {
            Some(session) => {
                let user = &session.user;
                println!("{} <{}> (id={})", user.username, user.email, user.id);
                if let Some(exp) = session.expires_at() {
                    println!("токен действует до: {exp}");
                }
            }
            None => println!("Вход не выполнен"),
        },
        Command::Create {
            title,
            content,
            image_url,
        } => {
            let post = client
                .create_post(&NewPost {
                    title,
                    content,
                    image_url,
                })
                .await?;
            print_post("Пост создан", &post);
        }
        Command::Get { id } => {
            let post = client.get_post(id).await?;
            print_post("Пост", &post);
        }
        Command::Update {
            id,
            title,
            content,
            image_url,
        } => {
            let update = build_update(title, content, image_url)?;
            let post = client.update_post(id, &update).await?;
            print_post("Пост обновлён", &post);
        }
        Command::Delete { id } => {
            client.delete_post(id).await?;
            println!("Пост удалён: id={id}");
        }
        Command::List {
            page,
            limit,
            search,
        } => {
            let query = ListQuery {
                page: page.max(1),
                limit,
                search,
            };
            let list = client.list_posts(&query).await?;
            print_list(&list, limit);
        }
        Command::Mine { page, limit } => {
            let list = client.list_my_posts(page.max(1), limit).await?;
            print_list(&list, limit);
        }
    }

    Ok(())
}

fn build_update(
    title: Option<String>,
    content: Option<String>,
    image_url: Option<String>,
) -> Result<PostUpdate, BlogClientError> {
    if title.is_none() && content.is_none() && image_url.is_none() {
        return Err(BlogClientError::InvalidRequest(
            "укажите хотя бы одно из --title, --content, --image-url".to_string(),
        ));
    }
    Ok(PostUpdate {
        title,
        image_url,
        content,
    })
}

fn resolve_server(flag: Option<String>, env: Option<String>) -> String {
    let raw = flag
        .or(env)
        .map(|server| server.trim().to_string())
        .filter(|server| !server.is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    normalize_server(raw)
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn map_client_error(err: BlogClientError) -> anyhow::Error {
    let message = match err {
        BlogClientError::Unauthorized(reason) => format!(
            "требуется авторизация ({reason}): выполните `blog-cli login ...` или `blog-cli register ...`"
        ),
        BlogClientError::Forbidden(message) => format!("доступ запрещён: {message}"),
        BlogClientError::NotFound => "ресурс не найден".to_string(),
        BlogClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        BlogClientError::Server(message) => format!("ошибка сервера: {message}"),
        BlogClientError::Http(err) => format!("ошибка HTTP: {err}"),
        BlogClientError::Storage(err) => format!("ошибка файла сессии: {err}"),
        BlogClientError::CorruptedSession(err) => format!("файл сессии повреждён: {err}"),
    };
    anyhow::anyhow!(message)
}

fn print_auth(auth: &AuthResponse) {
    println!("{}", auth.message);
    println!("token: {}", auth.token);
    println!("user:");
    println!("  id: {}", auth.user.id);
    println!("  username: {}", auth.user.username);
    println!("  email: {}", auth.user.email);
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    if let Some(image_url) = &post.image_url {
        println!("image: {image_url}");
    }
    println!("content: {}", post.content);
    println!("author: {} (id={})", post.username, post.user_id);
    println!("created_at: {}", post.created_at);
    println!("updated_at: {}", post.updated_at);
}

fn print_list(list: &ListPostsResponse, limit: u32) {
    let mut cursor = PostsCursor::new(limit);
    cursor.apply(list);

    println!(
        "Страница {}/{} (постов на странице: {}, всего: {})",
        cursor.page(),
        cursor.total_pages(),
        list.posts.len(),
        list.total
    );

    for post in &list.posts {
        println!("- [{}] {} (@{})", post.id, post.title, post.username);
    }

    if let Some(hint) = page_hint(&cursor) {
        println!("{hint}");
    }
}

fn page_hint(cursor: &PostsCursor) -> Option<String> {
    match (cursor.has_prev(), cursor.has_next()) {
        (false, false) => None,
        (true, false) => Some(format!("предыдущая: --page {}", cursor.page() - 1)),
        (false, true) => Some(format!("следующая: --page {}", cursor.page() + 1)),
        (true, true) => Some(format!(
            "предыдущая: --page {}, следующая: --page {}",
            cursor.page() - 1,
            cursor.page() + 1
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(current_page: u32, total_pages: u32) -> ListPostsResponse {
        ListPostsResponse {
            posts: Vec::new(),
            total_pages,
            current_page,
            total: u64::from(total_pages) * 10,
        }
    }

    #[test]
    fn normalize_server_keeps_scheme() {
        let s = normalize_server("https://example.com:8080".to_string());
        assert_eq!(s, "https://example.com:8080");
    }

    #[test]
    fn normalize_server_adds_http_scheme() {
        let s = normalize_server("127.0.0.1:5000".to_string());
        assert_eq!(s, "http://127.0.0.1:5000");
    }

    #[test]
    fn resolve_server_prefers_flag_then_env() {
        assert_eq!(resolve_server(None, None), DEFAULT_SERVER);
        assert_eq!(
            resolve_server(None, Some("blog.local:8000".to_string())),
            "http://blog.local:8000"
        );
        assert_eq!(
            resolve_server(
                Some("localhost:9999".to_string()),
                Some("blog.local:8000".to_string())
            ),
            "http://localhost:9999"
        );
    }

    #[test]
    fn resolve_server_ignores_blank_values() {
        assert_eq!(resolve_server(Some("  ".to_string()), None), DEFAULT_SERVER);
    }

    #[test]
    fn update_requires_at_least_one_field() {
        let err = build_update(None, None, None).expect_err("empty update must fail");
        assert!(matches!(err, BlogClientError::InvalidRequest(_)));

        let update = build_update(None, None, Some(String::new())).expect("image removal");
        assert_eq!(update.image_url.as_deref(), Some(""));
        assert!(update.title.is_none());
    }

    #[test]
    fn page_hint_reflects_cursor_position() {
        let mut cursor = PostsCursor::new(10);
        cursor.apply(&page(1, 1));
        assert!(page_hint(&cursor).is_none());

        cursor.apply(&page(2, 3));
        assert_eq!(
            page_hint(&cursor).as_deref(),
            Some("предыдущая: --page 1, следующая: --page 3")
        );

        cursor.apply(&page(3, 3));
        assert_eq!(page_hint(&cursor).as_deref(), Some("предыдущая: --page 2"));
    }

    #[test]
    fn only_token_commands_reset_the_session_on_401() {
        let parse = |args: &[&str]| {
            Cli::try_parse_from(std::iter::once("blog-cli").chain(args.iter().copied()))
                .expect("args must parse")
                .command
        };

        assert!(!parse(&["login", "--email", "a@example.com", "--password", "x"]).uses_session_token());
        assert!(
            !parse(&["register", "--username", "alice", "--email", "a@example.com", "--password", "x"])
                .uses_session_token()
        );
        assert!(!parse(&["list"]).uses_session_token());
        assert!(!parse(&["get", "--id", "1"]).uses_session_token());
        assert!(parse(&["mine"]).uses_session_token());
        assert!(parse(&["delete", "--id", "1"]).uses_session_token());
        assert!(parse(&["update", "--id", "1", "--title", "New title"]).uses_session_token());
    }

    #[test]
    fn cli_parses_login_by_email() {
        let cli = Cli::try_parse_from([
            "blog-cli",
            "login",
            "--email",
            "alice@example.com",
            "--password",
            "secret1",
        ])
        .expect("args must parse");
        assert!(matches!(cli.command, Command::Login { ref email, .. } if email == "alice@example.com"));
        assert_eq!(cli.session_file, PathBuf::from(SESSION_FILE));
    }
}
