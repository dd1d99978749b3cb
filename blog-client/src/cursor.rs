use crate::models::{ListPostsResponse, ListQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Состояние постраничного просмотра списка постов.
///
/// Страница меняется только в пределах `[1, total_pages]`; пока ни одна
/// страница не загружена, курсор стоит на первой.
pub struct PostsCursor {
    page: u32,
    total_pages: u32,
    limit: u32,
    search: Option<String>,
}

impl PostsCursor {
    /// Курсор на первой странице с заданным размером страницы.
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            total_pages: 0,
            limit: limit.max(1),
            search: None,
        }
    }

    /// Текущая страница (с 1).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Число страниц по последнему ответу сервера.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Задаёт поисковую строку и возвращается на первую страницу.
    pub fn set_search(&mut self, search: Option<String>) {
        self.search = search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());
        self.page = 1;
        self.total_pages = 0;
    }

    /// Запрос для текущей страницы.
    pub fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            limit: self.limit,
            search: self.search.clone(),
        }
    }

    /// Обновляет состояние по ответу сервера.
    pub fn apply(&mut self, response: &ListPostsResponse) {
        self.total_pages = response.total_pages;
        self.page = response.current_page.clamp(1, self.total_pages.max(1));
    }

    /// Есть ли следующая страница.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Есть ли предыдущая страница.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Переходит на следующую страницу; `false`, если это последняя.
    pub fn next_page(&mut self) -> bool {
        self.go_to(self.page.saturating_add(1))
    }

    /// Переходит на предыдущую страницу; `false`, если это первая.
    pub fn prev_page(&mut self) -> bool {
        self.go_to(self.page.saturating_sub(1))
    }

    /// Переходит на страницу `page`, если она в пределах `[1, total_pages]`.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page == 0 || page > self.total_pages.max(1) || page == self.page {
            return false;
        }
        self.page = page;
        true
    }
}
