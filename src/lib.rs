/*!
# CSV Desk

A small browser-based utility for working with CSV order exports, built in Rust.

## Overview

A user uploads a CSV file, previews its first rows, filters it by order date
and restaurant name, downloads the filtered subset, emails a per-day count of
orders, or previews what the file would look like with the filtered rows
deleted. The uploaded file is never modified; every request re-reads it.

## Architecture

### Data Layer (always compiled)
- **table**: In-memory table of raw text cells
- **loader**: CSV decoding (UTF-8 with Latin-1 fallback), header cleanup,
  upload file-name checks
- **dates**: Lenient date coercion used by the filter and the summary
- **filter**: Optional equality filters and simulated deletion
- **summary**: Datewise row counts rendered as plain text
- **downloader**: CSV export of a filtered table

### Web Layer (`web` feature)
- **app**: Routing and handlers (axum)
- **session**: Cookie sessions holding the current upload and flash messages
- **render**: Handlebars page template and HTML preview tables
- **mailer**: SMTP delivery of the summary (lettre)
- **config**: `.env`, environment and command line settings
- **logging**: tracing subscriber setup

## Routes

- `GET /` - Main page
- `POST /upload` - Multipart upload of a `.csv` file (field `file`)
- `GET /display` - Preview of the first 50 rows
- `POST /email` - Email the datewise summary to `recipient_email`
- `POST /filter_action` - Filter by `filter_date` / `filter_restaurant`, then
  `action=download` or `action=delete` (simulation)
*/

pub mod dates;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod loader;
pub mod summary;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod logging;
#[cfg(feature = "web")]
pub mod mailer;
#[cfg(feature = "web")]
pub mod render;
#[cfg(feature = "web")]
pub mod session;

pub use error::{AppError, Result};
pub use filter::{FilterCriteria, FilterOutcome};
pub use table::Table;
