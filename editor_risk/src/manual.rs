/*!

This is the long-form manual for `editor_risk` and `geoeditors`.

## The monthly dataset

The Wikimedia Foundation publishes every month the number of editors per
country and project, bucketed by activity level. Each month is one
tab-separated file without header, with the following columns:

| column | content |
|--------|---------|
| `wiki_db` | database name of the project |
| `project` | e.g. `en.wikipedia` |
| `country` | the name of the country |
| `country_code` | ISO 3166-1 alpha-2, `--` when unknown |
| `activity_level` | `1 to 4`, `5 to 99` or `100 or more` edits |
| `count_eps`, `sum_eps`, `count_release_thresh` | differential privacy bookkeeping |
| `editors` | the number of editors, `-1` when withheld |
| `edits` | the number of edits |
| `month` | `YYYY-MM` |

## Risk levels

Every country is assigned a level:

| level | confidence interval | countries |
|-------|---------------------|-----------|
| `low` | ± 2.72 | all the countries not listed below |
| `medium` | ± 14.98 | AF AZ BD DJ ET HN IQ KZ KW LA NI OM PK PS SD TJ AE UZ VE YE |
| `high` | ± 29.96 | BH BY EG ER RU SA TR TM |
| `not_published` | none | CN HK CU IR MO MM KP SY VN, and the unknown code |

The counts of the `not_published` countries are never shown, whatever the
dataset contains. A count of `-1` is never shown either, whatever the level.
Values that are not numbers are treated as withheld as well, and reported in
the logs as such.

## Withheld countries

The dataset omits the countries it withholds. When a month is ingested, one
withheld row (`editors = -1`) is added for every withheld country, every
project and every activity level of the month, unless the country already has
a row for that project and level. The list of withheld countries changed in January 2024:

* before `2024-01`: 35 countries, see [`crate::policy::LEGACY_UNPUBLISHED`]
* from `2024-01` on: 9 countries, see [`crate::policy::CURRENT_UNPUBLISHED`]

## Map colors

Displayed counts are colored on a log scale from 1 to the largest count of
the request rounded up to the next hundred, through `#440154`, `#21918c` and
`#fde725`. Withheld countries are filled with `#404040`.

## The `geoeditors` program

```bash
# Download the missing months into ./data
geoeditors update

# The choropleth of a month, as a GeoJSON feature collection
geoeditors map --month 2024-05 --project en.wikipedia --activity-level "5 to 99"

# The trends of some countries
geoeditors trends --countries US --countries IN --countries PK
```

All the commands accept a JSON configuration file with `--config`:

```json
{
  "dataDirectory": "data",
  "datasetUrl": "https://analytics.wikimedia.org/published/datasets/geoeditors_monthly",
  "firstMonth": "2023-07",
  "defaultProject": "en.wikipedia",
  "defaultActivityLevel": "1 to 4"
}
```

The output goes to the standard output unless `--out` is given. With
`--reference`, the output is compared to a reference file and the program
fails if they differ.

*/
