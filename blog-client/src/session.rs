//! Сессия пользователя: токен и данные пользователя, переживающие перезапуск клиента.
//!
//! Жизненный цикл: `hydrate` (загрузка из хранилища; повреждённые или
//! просроченные данные удаляются) → `login` (сохранение) → `logout` (очистка).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BlogClientError, BlogClientResult};
use crate::models::{AuthResponse, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Токен и пользователь, для которого он выдан.
pub struct Session {
    /// JWT access token.
    pub token: String,
    /// Данные пользователя.
    pub user: User,
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

impl Session {
    /// Момент истечения токена из claim `exp`.
    ///
    /// Подпись не проверяется: значение подсказка для клиента, решение
    /// принимает сервер.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<ExpiryClaims>(&self.token, &DecodingKey::from_secret(&[]), &validation)
            .ok()?;
        DateTime::from_timestamp(data.claims.exp?, 0)
    }

    /// Токен без читаемого `exp` считается просроченным.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|exp| now >= exp)
    }
}

impl From<AuthResponse> for Session {
    fn from(auth: AuthResponse) -> Self {
        Self {
            token: auth.token,
            user: auth.user,
        }
    }
}

/// Хранилище сессии.
pub trait SessionStore {
    /// Загружает сессию; `Ok(None)`, если её нет.
    fn load(&self) -> BlogClientResult<Option<Session>>;
    /// Сохраняет сессию, заменяя предыдущую.
    fn save(&self, session: &Session) -> BlogClientResult<()>;
    /// Удаляет сессию. Отсутствие сессии не ошибка.
    fn clear(&self) -> BlogClientResult<()>;
}

#[derive(Debug, Clone)]
/// Сессия в JSON-файле (используется CLI).
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Создаёт хранилище поверх файла `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Путь к файлу сессии.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> BlogClientResult<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, session: &Session) -> BlogClientResult<()> {
        let raw = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> BlogClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
/// Сессия в памяти процесса.
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    /// Пустое хранилище.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> BlogClientResult<Option<Session>> {
        Ok(self.slot().clone())
    }

    fn save(&self, session: &Session) -> BlogClientResult<()> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> BlogClientResult<()> {
        *self.slot() = None;
        Ok(())
    }
}

#[derive(Debug)]
/// Текущая сессия поверх хранилища.
pub struct SessionManager<S: SessionStore> {
    store: S,
    current: Option<Session>,
}

impl<S: SessionStore> SessionManager<S> {
    /// Менеджер без активной сессии; вызовите `hydrate`, чтобы загрузить сохранённую.
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Текущая сессия, если пользователь вошёл.
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Загружает сессию из хранилища.
    pub fn hydrate(&mut self) -> BlogClientResult<Option<&Session>> {
        self.hydrate_at(Utc::now())
    }

    /// Как `hydrate`, но с явным текущим временем.
    pub fn hydrate_at(&mut self, now: DateTime<Utc>) -> BlogClientResult<Option<&Session>> {
        self.current = match self.store.load() {
            Ok(Some(session)) if session.is_expired_at(now) => {
                debug!(user_id = session.user.id, "stored session expired");
                self.store.clear()?;
                None
            }
            Ok(session) => session,
            Err(BlogClientError::CorruptedSession(err)) => {
                debug!(error = %err, "stored session is corrupted");
                self.store.clear()?;
                None
            }
            Err(err) => return Err(err),
        };
        Ok(self.current.as_ref())
    }

    /// Сохраняет новую сессию после успешного входа или регистрации.
    pub fn login(&mut self, session: Session) -> BlogClientResult<&Session> {
        self.store.save(&session)?;
        Ok(&*self.current.insert(session))
    }

    /// Завершает сессию и очищает хранилище.
    pub fn logout(&mut self) -> BlogClientResult<()> {
        self.current = None;
        self.store.clear()
    }
}
